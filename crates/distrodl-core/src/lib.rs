pub mod config;
pub mod logging;

pub mod catalog;
pub mod checksum;
pub mod control;
pub mod progress;
pub mod session;
pub mod storage;
pub mod transfer;
