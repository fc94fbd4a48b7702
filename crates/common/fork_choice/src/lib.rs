pub mod error;
pub mod proto_array;
pub mod store;
