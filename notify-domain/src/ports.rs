// Port traits (interfaces)
// Define what the coordinator needs from a transport binding

pub mod notification_proxy;

pub use notification_proxy::*;
