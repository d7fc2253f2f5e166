pub mod errors;
pub mod init;
pub mod logger;
pub mod message;
pub mod render;
pub mod route;
