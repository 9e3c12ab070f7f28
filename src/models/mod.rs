pub mod line;
pub mod mold_change;
pub mod schedule;
pub mod shift;
pub mod status;
