pub mod downtime;
pub mod target;
