pub mod add;
pub mod calculator;
pub mod complete;
pub mod counter;
pub mod log;
pub mod stats;
