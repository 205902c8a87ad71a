use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{PartError, Result};
use crate::naming::{is_part_file, PartName};

/// Extension given to the combined file when no output path is set.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "safetensors";

#[derive(Debug, Clone)]
pub struct CombineOptions {
    /// Explicit output path; defaults to `<dir>/<stem>.<extension>`
    pub output: Option<PathBuf>,
    /// Extension for the inferred output name
    pub extension: String,
    /// Only combine parts of this original file
    pub stem: Option<String>,
    /// Skip over missing indices with a warning instead of failing
    pub allow_gaps: bool,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            output: None,
            extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            stem: None,
            allow_gaps: false,
        }
    }
}

/// A chunk file found on disk.
#[derive(Debug, Clone)]
pub struct PartFile {
    pub name: PartName,
    pub path: PathBuf,
}

/// List the `.part` files directly inside `dir`, sorted by numeric index.
///
/// With `stem` set, parts of other files are ignored. Fails if nothing is
/// found, if parts of several files are mixed together, or if an index repeats.
pub fn find_parts(dir: &Path, stem: Option<&str>) -> Result<Vec<PartFile>> {
    if !dir.is_dir() {
        return Err(PartError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut parts = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !is_part_file(file_name) {
            continue;
        }

        let name = match (PartName::parse(file_name), stem) {
            (Ok(name), Some(s)) if s != name.stem => continue,
            (Ok(name), _) => name,
            // Unrelated files only matter when no stem narrows the search.
            (Err(e), Some(_)) => {
                tracing::debug!("Skipping {}: {}", file_name, e);
                continue;
            }
            (Err(e), None) => return Err(e),
        };

        parts.push(PartFile {
            name,
            path: entry.path(),
        });
    }

    if parts.is_empty() {
        return Err(PartError::NoParts(dir.to_path_buf()));
    }

    let stems: BTreeSet<&str> = parts.iter().map(|p| p.name.stem.as_str()).collect();
    if stems.len() > 1 {
        return Err(PartError::MixedStems(
            stems.into_iter().map(str::to_string).collect(),
        ));
    }

    parts.sort_by_key(|p| p.name.index);

    if let Some(dup) = parts.windows(2).find(|w| w[0].name.index == w[1].name.index) {
        return Err(PartError::DuplicateIndex {
            index: dup[0].name.index,
        });
    }

    Ok(parts)
}

/// Check that indices run 0, 1, 2, ... without holes.
///
/// With `allow_gaps` every hole is logged and skipped instead.
fn check_contiguous(parts: &[PartFile], allow_gaps: bool) -> Result<()> {
    let mut expected = 0u64;
    for part in parts {
        if part.name.index != expected {
            if !allow_gaps {
                return Err(PartError::MissingPart { index: expected });
            }
            tracing::warn!(
                "Parts {}..{} are missing; the combined file will be incomplete",
                expected,
                part.name.index
            );
        }
        expected = part.name.index + 1;
    }
    Ok(())
}

/// Concatenate the `.part` files in `dir` in index order.
///
/// Returns the path of the combined file.
pub fn combine_files_from_directory(dir: &Path, options: &CombineOptions) -> Result<PathBuf> {
    let parts = find_parts(dir, options.stem.as_deref())?;
    check_contiguous(&parts, options.allow_gaps)?;

    let output = match &options.output {
        Some(path) => path.clone(),
        None => {
            // find_parts guarantees a single shared stem
            let stem = &parts[0].name.stem;
            if options.extension.is_empty() {
                dir.join(stem)
            } else {
                dir.join(format!("{}.{}", stem, options.extension))
            }
        }
    };

    tracing::info!("Found {} part(s), combining...", parts.len());

    let mut writer = BufWriter::new(File::create(&output)?);
    for (i, part) in parts.iter().enumerate() {
        tracing::info!(
            "Merging part {}/{}: {}",
            i + 1,
            parts.len(),
            part.path.display()
        );
        let mut reader = File::open(&part.path)?;
        io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()?;

    tracing::info!("Combined file written to {}", output.display());
    Ok(output)
}
