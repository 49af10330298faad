pub mod handlers;
pub mod persist;
pub mod pipeline;
