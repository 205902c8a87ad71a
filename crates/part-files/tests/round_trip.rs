//! Split and combine against real files in temporary directories.

use std::fs;
use std::path::Path;

use part_files::{
    combine_files_from_directory, find_parts, split_file, CombineOptions, PartError, SplitOptions,
};
use tempfile::TempDir;

fn small_chunks(chunk_size: u64) -> SplitOptions {
    SplitOptions {
        chunk_size,
        ..Default::default()
    }
}

/// Deterministic, non-repeating-looking content.
fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Split `data` with `chunk_size`, move the parts to their own directory,
/// combine them and return the combined bytes.
fn round_trip(data: &[u8], chunk_size: u64) -> (usize, Vec<u8>) {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("model.safetensors");
    fs::write(&source, data).unwrap();

    let parts_dir = temp_dir.path().join("parts");
    let options = SplitOptions {
        chunk_size,
        output_dir: Some(parts_dir.clone()),
        ..Default::default()
    };
    let parts = split_file(&source, &options).unwrap();

    let combined = combine_files_from_directory(&parts_dir, &CombineOptions::default()).unwrap();
    assert_eq!(combined, parts_dir.join("model.safetensors"));
    (parts.len(), fs::read(combined).unwrap())
}

#[test]
fn test_round_trip_empty_file() {
    let (count, combined) = round_trip(&[], 4);
    assert_eq!(count, 1, "Empty file still produces one part");
    assert!(combined.is_empty());
}

#[test]
fn test_round_trip_exactly_one_chunk() {
    let data = content(16);
    let (count, combined) = round_trip(&data, 16);
    assert_eq!(count, 1);
    assert_eq!(combined, data);
}

#[test]
fn test_round_trip_multiple_chunks() {
    let data = content(103);
    let (count, combined) = round_trip(&data, 10);
    assert_eq!(count, 11);
    assert_eq!(combined, data);
}

#[test]
fn test_round_trip_exact_multiple() {
    let data = content(40);
    let (count, combined) = round_trip(&data, 10);
    assert_eq!(count, 4, "No trailing empty part when size divides evenly");
    assert_eq!(combined, data);
}

#[test]
fn test_split_names_and_sizes() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("model.safetensors");
    fs::write(&source, content(25)).unwrap();

    let parts = split_file(&source, &small_chunks(10)).unwrap();

    let names: Vec<String> = parts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["model.000.part", "model.001.part", "model.002.part"]);
    for part in &parts {
        assert_eq!(part.parent().unwrap(), temp_dir.path());
    }

    let sizes: Vec<u64> = parts.iter().map(|p| fs::metadata(p).unwrap().len()).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[test]
fn test_split_custom_index_width() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("data.bin");
    fs::write(&source, content(5)).unwrap();

    let options = SplitOptions {
        chunk_size: 5,
        index_width: 5,
        output_dir: None,
    };
    let parts = split_file(&source, &options).unwrap();
    assert!(parts[0].ends_with("data.00000.part"));
}

#[test]
fn test_split_too_many_parts_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("model.bin");
    fs::write(&source, content(11)).unwrap();

    let options = SplitOptions {
        chunk_size: 1,
        index_width: 1,
        output_dir: None,
    };
    let err = split_file(&source, &options).unwrap_err();
    assert!(matches!(
        err,
        PartError::TooManyParts {
            needed: 11,
            width: 1,
            max: 10
        }
    ));
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_split_missing_source() {
    let temp_dir = TempDir::new().unwrap();
    let err = split_file(&temp_dir.path().join("nope.bin"), &SplitOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::SourceNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_split_directory_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let err = split_file(temp_dir.path(), &SplitOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::NotAFile(_)));
}

#[test]
fn test_split_zero_chunk_size() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("model.bin");
    fs::write(&source, b"abc").unwrap();
    assert!(matches!(
        split_file(&source, &small_chunks(0)),
        Err(PartError::ZeroChunkSize)
    ));
}

fn write_part(dir: &Path, name: &str, data: &[u8]) {
    fs::write(dir.join(name), data).unwrap();
}

#[test]
fn test_combine_orders_numerically() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    // Lexical order would put 10 before 2 and 9.
    write_part(dir, "model.10.part", b"K");
    write_part(dir, "model.2.part", b"C");
    write_part(dir, "model.9.part", b"J");
    for (i, letter) in ["A", "B", "D", "E", "F", "G", "H", "I"].iter().enumerate() {
        let index = if i < 2 { i } else { i + 1 };
        write_part(dir, &format!("model.{}.part", index), letter.as_bytes());
    }

    let output = combine_files_from_directory(dir, &CombineOptions::default()).unwrap();
    assert_eq!(fs::read(output).unwrap(), b"ABCDEFGHIJK");
}

#[test]
fn test_find_parts_sorted_past_three_digits() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "model.1000.part", b"");
    write_part(dir, "model.999.part", b"");

    let parts = find_parts(dir, None).unwrap();
    let indices: Vec<u64> = parts.iter().map(|p| p.name.index).collect();
    assert_eq!(indices, vec![999, 1000]);
}

#[test]
fn test_combine_ignores_other_files() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "model.000.part", b"ab");
    write_part(dir, "model.001.part", b"cd");
    write_part(dir, "README.md", b"notes");
    fs::create_dir(dir.join("nested.000.part")).unwrap();

    let output = combine_files_from_directory(dir, &CombineOptions::default()).unwrap();
    assert_eq!(fs::read(output).unwrap(), b"abcd");
}

#[test]
fn test_combine_explicit_output_and_extension() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("parts");
    fs::create_dir(&dir).unwrap();
    write_part(&dir, "archive.000.part", b"xy");

    let renamed = combine_files_from_directory(
        &dir,
        &CombineOptions {
            extension: "tar".to_string(),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(renamed, dir.join("archive.tar"));

    let explicit = temp_dir.path().join("out.bin");
    let written = combine_files_from_directory(
        &dir,
        &CombineOptions {
            output: Some(explicit.clone()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(written, explicit);
    assert_eq!(fs::read(explicit).unwrap(), b"xy");
}

#[test]
fn test_combine_gap_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "model.000.part", b"a");
    write_part(dir, "model.002.part", b"c");

    let err = combine_files_from_directory(dir, &CombineOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::MissingPart { index: 1 }));
    assert!(!dir.join("model.safetensors").exists(), "No output on a detected gap");
}

#[test]
fn test_combine_gap_allowed() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "model.000.part", b"a");
    write_part(dir, "model.002.part", b"c");

    let options = CombineOptions {
        allow_gaps: true,
        ..Default::default()
    };
    let output = combine_files_from_directory(dir, &options).unwrap();
    assert_eq!(fs::read(output).unwrap(), b"ac");
}

#[test]
fn test_combine_duplicate_index() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "model.1.part", b"a");
    write_part(dir, "model.001.part", b"b");
    write_part(dir, "model.000.part", b"c");

    let err = combine_files_from_directory(dir, &CombineOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::DuplicateIndex { index: 1 }));
}

#[test]
fn test_combine_mixed_stems() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "a.000.part", b"a");
    write_part(dir, "b.000.part", b"b");

    let err = combine_files_from_directory(dir, &CombineOptions::default()).unwrap_err();
    match err {
        PartError::MixedStems(stems) => assert_eq!(stems, vec!["a", "b"]),
        other => panic!("expected MixedStems, got {other:?}"),
    }

    let options = CombineOptions {
        stem: Some("b".to_string()),
        ..Default::default()
    };
    let output = combine_files_from_directory(dir, &options).unwrap();
    assert_eq!(output, dir.join("b.safetensors"));
    assert_eq!(fs::read(output).unwrap(), b"b");
}

#[test]
fn test_combine_invalid_part_name() {
    let temp_dir = TempDir::new().unwrap();
    write_part(temp_dir.path(), "model.final.part", b"a");

    let err = combine_files_from_directory(temp_dir.path(), &CombineOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::InvalidPartName(_)));
}

#[test]
fn test_combine_stem_skips_malformed_parts() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_part(dir, "notes.part", b"stray");
    write_part(dir, "model.001.part", b"b");
    write_part(dir, "model.000.part", b"a");

    let options = CombineOptions {
        stem: Some("model".to_string()),
        ..Default::default()
    };
    let output = combine_files_from_directory(dir, &options).unwrap();
    assert_eq!(fs::read(output).unwrap(), b"ab");
}

#[test]
fn test_combine_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let err = combine_files_from_directory(temp_dir.path(), &CombineOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::NoParts(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_combine_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let err = combine_files_from_directory(&temp_dir.path().join("gone"), &CombineOptions::default())
        .unwrap_err();
    assert!(matches!(err, PartError::DirectoryNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_combine_file_instead_of_directory() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("model.000.part");
    fs::write(&file, b"a").unwrap();

    let err = combine_files_from_directory(&file, &CombineOptions::default()).unwrap_err();
    assert!(matches!(err, PartError::DirectoryNotFound(_)));
}
