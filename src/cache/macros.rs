/// 声明一个计数缓存插件
///
/// 生成 `register_plugin()`，并通过 ctor 在进程启动时自动注册。
/// 类型需要提供 `async fn from_config(&CacheConfig) -> Result<Self>`。
#[macro_export]
macro_rules! declare_counter_cache_plugin {
    ($name:expr, $ty:ty) => {
        pub(crate) fn register_plugin() {
            use std::sync::Arc;
            use $crate::cache::register::register_counter_cache_plugin;

            register_counter_cache_plugin(
                $name,
                Arc::new(|config: $crate::config::CacheConfig| {
                    Box::pin(async move {
                        let cache = <$ty>::from_config(&config).await?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::traits::CounterCache>)
                    })
                }),
            );
        }

        #[ctor::ctor]
        fn __register_counter_cache_plugin() {
            register_plugin();
        }
    };
}
