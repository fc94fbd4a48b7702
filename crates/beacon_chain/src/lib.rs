pub mod checkpoints;
pub mod config;
pub mod error;
pub mod head;
pub mod notifications;
pub mod service;
