pub mod server;
pub mod workflow;
