pub mod actuation;
pub mod body;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod receiver;
pub mod retarget;
pub mod session;
pub mod stream;
pub mod vision;
