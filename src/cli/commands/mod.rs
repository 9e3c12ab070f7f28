pub mod add;
pub mod complete;
pub mod config;
pub mod counter;
pub mod del;
pub mod export;
pub mod init;
pub mod list;
pub mod log;
pub mod mold_info;
pub mod schedule;
pub mod serve;
pub mod status;
