pub mod config;
pub mod proxies;

pub use config::*;
pub use proxies::*;
