pub mod codec;
pub mod db;
pub mod filter;
pub mod in_memory;
