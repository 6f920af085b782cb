//! container/encode.rs
//! Builds the metadata region that precedes a sealed payload.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::constants::{CONTAINER_MAGIC, MAX_METADATA_LEN};
use crate::container::types::{ContainerError, Metadata, METADATA_CRC_LEN, METADATA_PREFIX_LEN};
use crate::utils::compute_checksum;

/// Encode `meta` as `[u32 LE len][magic ‖ json ‖ crc32]`, ready to write
/// ahead of the first payload byte.
pub fn encode_metadata(meta: &Metadata) -> Result<Vec<u8>, ContainerError> {
    let json = serde_json::to_vec(meta)?;
    let body_len = CONTAINER_MAGIC.len() + json.len() + METADATA_CRC_LEN;
    if body_len > MAX_METADATA_LEN {
        return Err(ContainerError::MetadataTooLarge { len: body_len, max: MAX_METADATA_LEN });
    }

    let mut out = Vec::with_capacity(METADATA_PREFIX_LEN + body_len);
    out.write_u32::<LittleEndian>(body_len as u32)?;
    out.extend_from_slice(&CONTAINER_MAGIC);
    out.extend_from_slice(&json);
    out.write_u32::<LittleEndian>(compute_checksum(&json))?;

    debug_assert_eq!(out.len(), METADATA_PREFIX_LEN + body_len);
    Ok(out)
}
