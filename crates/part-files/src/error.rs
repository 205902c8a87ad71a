use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartError {
    #[error("File not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Directory not found or not a directory: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("No .part files found in {}", .0.display())]
    NoParts(PathBuf),

    #[error("Invalid part file name: {0}")]
    InvalidPartName(String),

    #[error("Directory holds parts of more than one file: {}", .0.join(", "))]
    MixedStems(Vec<String>),

    #[error("Part index {index} appears more than once")]
    DuplicateIndex { index: u64 },

    #[error("Part {index} is missing from the sequence")]
    MissingPart { index: u64 },

    #[error("{needed} parts needed but a {width}-digit index allows at most {max}")]
    TooManyParts { needed: u64, width: usize, max: u64 },

    #[error("Chunk size must be at least 1 byte")]
    ZeroChunkSize,

    #[error("Index width must be at least 1 digit")]
    ZeroIndexWidth,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PartError {
    /// True for the "missing resource" family: no source file, no directory, no parts.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PartError::SourceNotFound(_) | PartError::DirectoryNotFound(_) | PartError::NoParts(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PartError>;
