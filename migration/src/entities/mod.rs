pub mod click_event;
pub mod session;
pub mod user;

pub use click_event::Entity as ClickEventEntity;
pub use session::Entity as SessionEntity;
pub use user::Entity as UserEntity;
