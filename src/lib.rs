pub mod clear_cache;
pub mod restart_service;

pub const CACHEBUST_LOG_PATH_DEFAULT: &str = "/tmp/cachebust/logs/log.log";
