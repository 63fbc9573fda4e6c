//! Binary artifact format for the vector index.
//!
//! # Format
//!
//! - Header (16 bytes): magic `TVEC`, format version, dimension, count,
//!   each u32 little-endian
//! - Body: `count * dimension` f32 values in little-endian, row-major
//!
//! The writer produces the full byte image in memory (the caller renames
//! it into place for atomicity); the reader memory-maps the file so the
//! OS page cache does the heavy lifting on reload.

use std::fs::File;
use std::path::Path;

use memmap2::MmapOptions;

use crate::vector::index::VectorIndex;
use crate::vector::types::{VectorDimension, VectorError};

/// Current artifact format version.
const FORMAT_VERSION: u32 = 1;

/// Size of the artifact header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes identifying a vector artifact.
const MAGIC_BYTES: &[u8; 4] = b"TVEC";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Serializes the index into the artifact byte layout.
#[must_use]
pub fn write_vector_artifact(index: &VectorIndex) -> Vec<u8> {
    let dimension = index.dimension().map_or(0, |d| d.get());
    let flat = index.as_flat();

    let mut bytes = Vec::with_capacity(HEADER_SIZE + flat.len() * BYTES_PER_F32);
    bytes.extend_from_slice(MAGIC_BYTES);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dimension as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u32).to_le_bytes());
    for value in flat {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Reads a vector artifact back into an index.
///
/// Fails with `InvalidFormat`/`VersionMismatch` when the file is not a
/// well-formed artifact (truncated, wrong magic, unknown version), and
/// with `Storage` when the file cannot be opened at all.
pub fn read_vector_artifact(path: &Path) -> Result<VectorIndex, VectorError> {
    let file = File::open(path)?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };

    if mmap.len() < HEADER_SIZE {
        return Err(VectorError::InvalidFormat(
            "file too small to contain header".to_string(),
        ));
    }
    if &mmap[0..4] != MAGIC_BYTES {
        return Err(VectorError::InvalidFormat("invalid magic bytes".to_string()));
    }

    let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
    if version != FORMAT_VERSION {
        return Err(VectorError::VersionMismatch {
            expected: FORMAT_VERSION,
            actual: version,
        });
    }

    let dimension = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]) as usize;
    let count = u32::from_le_bytes([mmap[12], mmap[13], mmap[14], mmap[15]]) as usize;

    if count == 0 {
        return Ok(VectorIndex::empty());
    }

    let dimension = VectorDimension::new(dimension)?;
    let expected_len = HEADER_SIZE + count * dimension.get() * BYTES_PER_F32;
    if mmap.len() != expected_len {
        return Err(VectorError::InvalidFormat(format!(
            "expected {} bytes for {} vectors of dimension {}, found {}",
            expected_len,
            count,
            dimension,
            mmap.len()
        )));
    }

    let mut data = Vec::with_capacity(count * dimension.get());
    for chunk in mmap[HEADER_SIZE..].chunks_exact(BYTES_PER_F32) {
        data.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    VectorIndex::from_parts(dimension, data, count)
}
