//! The `<stem>.<index>.part` naming convention.

use crate::error::{PartError, Result};

pub const PART_EXTENSION: &str = "part";

/// Digits in the zero-padded index unless told otherwise.
pub const DEFAULT_INDEX_WIDTH: usize = 3;

/// A parsed chunk file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartName {
    /// Name of the original file without its extension
    pub stem: String,
    pub index: u64,
}

impl PartName {
    /// Parse `model.007.part` into stem `model` and index 7.
    ///
    /// The index is read as a number, so any width is accepted.
    pub fn parse(file_name: &str) -> Result<Self> {
        let invalid = || PartError::InvalidPartName(file_name.to_string());

        let base = file_name
            .strip_suffix(PART_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(invalid)?;
        let (stem, digits) = base.rsplit_once('.').ok_or_else(invalid)?;

        if stem.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let index = digits.parse().map_err(|_| invalid())?;

        Ok(Self {
            stem: stem.to_string(),
            index,
        })
    }

    /// Render the file name with an index padded to `width` digits.
    pub fn file_name(&self, width: usize) -> String {
        format!(
            "{}.{:0width$}.{}",
            self.stem,
            self.index,
            PART_EXTENSION,
            width = width
        )
    }
}

/// How many distinct indices a `width`-digit index can express.
pub fn index_capacity(width: usize) -> u64 {
    u32::try_from(width)
        .ok()
        .and_then(|w| 10u64.checked_pow(w))
        .unwrap_or(u64::MAX)
}

/// Whether a file name uses the `.part` extension at all.
pub fn is_part_file(file_name: &str) -> bool {
    file_name
        .strip_suffix(PART_EXTENSION)
        .is_some_and(|s| s.ends_with('.'))
}
