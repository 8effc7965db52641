// Domain entities
pub mod notification;
pub mod proxy_config;

pub use notification::*;
pub use proxy_config::*;
