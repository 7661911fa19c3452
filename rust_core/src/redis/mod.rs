mod bus;
pub mod cache;

pub use bus::{RedisBus, StreamEntry};
