pub mod config;
pub mod constants;
pub mod dispatch;
pub mod generation;
pub mod keyring;
pub mod message;
pub mod retry;
pub mod router;
pub mod session;
pub mod summary;
