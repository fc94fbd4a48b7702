//! Values are stored as snappy-compressed SSZ.

use anyhow::anyhow;
use snap::raw::{Decoder, Encoder};
use ssz::{Decode, Encode};

pub fn encode<T: Encode>(value: &T) -> anyhow::Result<Vec<u8>> {
    Encoder::new()
        .compress_vec(&value.as_ssz_bytes())
        .map_err(Into::into)
}

pub fn decode<T: Decode>(compressed: &[u8]) -> anyhow::Result<T> {
    let bytes = Decoder::new().decompress_vec(compressed)?;
    T::from_ssz_bytes(&bytes).map_err(|err| anyhow!("Failed to decode stored value {err:?}"))
}
