// Notify Domain Layer

pub mod entities;
pub mod error;
pub mod ports;
pub mod utils;

pub use entities::*;
pub use error::*;
pub use ports::*;
pub use utils::*;
