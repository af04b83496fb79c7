pub mod adapter;
pub mod fields;
pub mod message;
pub mod writer;

pub use adapter::{register, GelfAdapter, ADAPTER_NAME};
pub use message::{GelfMessage, Severity};
