pub mod statsapi;
pub mod synthetic;
