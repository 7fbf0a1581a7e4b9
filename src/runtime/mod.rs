//! Task execution primitives.

pub mod serial_executor;

pub use serial_executor::{BoxFuture, SerialExecutor, TaskHandle};
