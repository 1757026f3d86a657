pub mod logger;
pub mod server;
