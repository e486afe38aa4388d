pub mod chain_handlers;
pub mod file_handlers;
pub mod health_handlers;
