pub mod gap_fill;
pub mod sample;
pub mod signals;
pub mod views;
