use crate::cache::traits::CounterCache;
use crate::config::CacheConfig;
use crate::errors::Result;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

pub type BoxedCounterCacheFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn CounterCache>>> + Send>>;
pub type CounterCacheConstructor =
    Arc<dyn Fn(CacheConfig) -> BoxedCounterCacheFuture + Send + Sync>;

static COUNTER_CACHE_REGISTRY: Lazy<RwLock<HashMap<String, CounterCacheConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_counter_cache_plugin<S: Into<String>>(
    name: S,
    constructor: CounterCacheConstructor,
) {
    let name = name.into();
    let mut registry = COUNTER_CACHE_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name, constructor);
}

pub fn get_counter_cache_plugin(name: &str) -> Option<CounterCacheConstructor> {
    COUNTER_CACHE_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(name)
        .cloned()
}

pub fn registered_counter_cache_plugins() -> Vec<String> {
    let registry = COUNTER_CACHE_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<String> = registry.keys().cloned().collect();
    names.sort();
    names
}

pub fn debug_cache_registry() {
    let names = registered_counter_cache_plugins();
    if names.is_empty() {
        tracing::debug!("No Counter Cache plugins registered.");
    } else {
        tracing::debug!("Registered Counter Cache plugins:");
        for name in names {
            tracing::debug!(" - {}", name);
        }
    }
}
