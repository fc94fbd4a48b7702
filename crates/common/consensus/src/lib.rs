pub mod attestation;
pub mod attestation_data;
pub mod beacon_block;
pub mod beacon_block_body;
pub mod beacon_block_header;
pub mod beacon_state;
pub mod checkpoint;
pub mod constants;
pub mod deposit;
pub mod deposit_data;
pub mod eth_1_data;
pub mod interop;
pub mod misc;
pub mod pending_attestation;
pub mod pubkey;
pub mod signature;
pub mod validator;
