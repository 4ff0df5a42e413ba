pub mod record;
pub mod config;
pub mod sink;
pub mod appender;
pub mod backend;
pub mod logger;

pub mod slack;
pub mod webhook;

#[cfg(feature = "email")]
pub mod email;
