//! Split a large file into fixed-size `.part` chunks and put it back together.
//!
//! Parts are named `<stem>.<index>.part` with a zero-padded index. Combining
//! orders parts by the numeric value of that index, never by listing order.
//! There is no checksum: an interrupted run leaves partial output behind.

mod combine;
mod error;
mod naming;
mod split;

pub use combine::{
    combine_files_from_directory, find_parts, CombineOptions, PartFile, DEFAULT_OUTPUT_EXTENSION,
};
pub use error::{PartError, Result};
pub use naming::{index_capacity, is_part_file, PartName, DEFAULT_INDEX_WIDTH, PART_EXTENSION};
pub use split::{split_file, SplitOptions, DEFAULT_CHUNK_SIZE};

/// Parse a byte count such as `20M`, `512k`, `1G` or `1048576`.
///
/// Suffixes are binary (K = 1024). A trailing `B`/`iB` is accepted.
pub fn parse_byte_size(input: &str) -> std::result::Result<u64, String> {
    let s = input.trim();
    let upper = s.to_ascii_uppercase();
    let trimmed = upper
        .strip_suffix("IB")
        .or_else(|| upper.strip_suffix('B'))
        .unwrap_or(&upper);

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('K') => (&trimmed[..trimmed.len() - 1], 1u64 << 10),
        Some('M') => (&trimmed[..trimmed.len() - 1], 1u64 << 20),
        Some('G') => (&trimmed[..trimmed.len() - 1], 1u64 << 30),
        _ => (trimmed, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size: {:?}", input))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {:?}", input))
}
