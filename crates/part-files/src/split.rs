use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{PartError, Result};
use crate::naming::{index_capacity, PartName, DEFAULT_INDEX_WIDTH};

/// 20 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Bytes per part; the last part may be shorter
    pub chunk_size: u64,
    /// Digits in the zero-padded part index
    pub index_width: usize,
    /// Where parts are written; defaults to the source file's directory
    pub output_dir: Option<PathBuf>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            index_width: DEFAULT_INDEX_WIDTH,
            output_dir: None,
        }
    }
}

/// Split `path` into `<stem>.<index>.part` files of `chunk_size` bytes.
///
/// Reads sequentially and writes one part at a time. An empty source yields a
/// single empty part so it can still be combined. Nothing is written if the
/// part count would not fit in `index_width` digits.
///
/// Returns the produced paths in index order.
pub fn split_file(path: &Path, options: &SplitOptions) -> Result<Vec<PathBuf>> {
    if options.chunk_size == 0 {
        return Err(PartError::ZeroChunkSize);
    }
    if options.index_width == 0 {
        return Err(PartError::ZeroIndexWidth);
    }

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PartError::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Err(PartError::NotAFile(path.to_path_buf()));
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PartError::InvalidPartName(path.display().to_string()))?
        .to_string();

    let file_size = metadata.len();
    let num_chunks = file_size.div_ceil(options.chunk_size).max(1);

    let max = index_capacity(options.index_width);
    if num_chunks > max {
        return Err(PartError::TooManyParts {
            needed: num_chunks,
            width: options.index_width,
            max,
        });
    }

    let out_dir = match &options.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    tracing::info!(
        "Splitting {} ({} bytes) into {} part(s)",
        path.display(),
        file_size,
        num_chunks
    );

    let mut reader = BufReader::new(File::open(path)?);
    let mut parts = Vec::with_capacity(num_chunks as usize);

    for index in 0..num_chunks {
        let name = PartName {
            stem: stem.clone(),
            index,
        };
        let part_path = out_dir.join(name.file_name(options.index_width));

        let mut writer = BufWriter::new(File::create(&part_path)?);
        let written = io::copy(&mut (&mut reader).take(options.chunk_size), &mut writer)?;
        writer.flush()?;

        tracing::info!("Created part {} ({} bytes)", part_path.display(), written);
        parts.push(part_path);
    }

    Ok(parts)
}
