pub mod context;
pub mod lifecycle;

pub use lifecycle::{run_standalone, RunOptions};
