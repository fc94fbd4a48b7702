pub mod beacon;
pub mod config;
pub mod pagination;
pub mod status;
pub mod types;
