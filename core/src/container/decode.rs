//! container/decode.rs
//! Reads and validates the metadata region of a container.
//!
//! Validation order: length bound, magic, checksum, JSON, field ranges. Any failure means
//! the input is not a container this crate produced.

use byteorder::{ByteOrder, LittleEndian};

use crate::chunk::ChunkSource;
use crate::constants::{CONTAINER_MAGIC, MAX_CHUNK_SIZE, MAX_METADATA_LEN};
use crate::container::types::{ContainerError, Metadata, METADATA_CRC_LEN, METADATA_PREFIX_LEN};
use crate::utils::compute_checksum;

/// Decode the metadata body (the bytes after the length prefix).
pub fn decode_metadata(body: &[u8]) -> Result<Metadata, ContainerError> {
    let min = CONTAINER_MAGIC.len() + METADATA_CRC_LEN;
    if body.len() < min {
        return Err(ContainerError::TooShort { have: body.len() as u64, need: min as u64 });
    }

    let (magic, rest) = body.split_at(CONTAINER_MAGIC.len());
    if magic != CONTAINER_MAGIC {
        let mut have = [0u8; 4];
        have.copy_from_slice(magic);
        return Err(ContainerError::InvalidMagic { have });
    }

    let (json, crc) = rest.split_at(rest.len() - METADATA_CRC_LEN);
    let stored = LittleEndian::read_u32(crc);
    let computed = compute_checksum(json);
    if stored != computed {
        return Err(ContainerError::ChecksumMismatch { have: stored, need: computed });
    }

    let meta: Metadata = serde_json::from_slice(json)?;
    if meta.chunk_size == 0 || meta.chunk_size > MAX_CHUNK_SIZE {
        return Err(ContainerError::InvalidChunkSize(meta.chunk_size));
    }
    meta.stream_header()?;
    Ok(meta)
}

/// Read the metadata region from the front of `source`.
///
/// Returns the metadata and the offset of the first payload byte.
pub fn read_metadata<S: ChunkSource + ?Sized>(source: &mut S) -> Result<(Metadata, u64), ContainerError> {
    let total = source.total_len()?;
    let prefix = METADATA_PREFIX_LEN as u64;
    if total < prefix {
        return Err(ContainerError::TooShort { have: total, need: prefix });
    }

    let len_bytes = source.read_range(0, prefix)?;
    let body_len = LittleEndian::read_u32(&len_bytes) as usize;
    if body_len > MAX_METADATA_LEN {
        return Err(ContainerError::MetadataTooLarge { len: body_len, max: MAX_METADATA_LEN });
    }

    let payload_offset = prefix + body_len as u64;
    if total < payload_offset {
        return Err(ContainerError::TooShort { have: total, need: payload_offset });
    }

    let body = source.read_range(prefix, payload_offset)?;
    let meta = decode_metadata(&body)?;
    Ok((meta, payload_offset))
}
