//! part-files: split a large file into numbered chunks, or combine them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use part_files::{
    combine_files_from_directory, parse_byte_size, split_file, CombineOptions, SplitOptions,
    DEFAULT_CHUNK_SIZE, DEFAULT_INDEX_WIDTH, DEFAULT_OUTPUT_EXTENSION,
};

#[derive(Parser, Debug)]
#[command(name = "part-files")]
#[command(about = "Split files into fixed-size .part chunks and combine them again")]
struct Args {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a file into <stem>.<NNN>.part chunks beside it
    Split {
        /// File to split
        file: PathBuf,

        /// Bytes per chunk (accepts K/M/G suffixes)
        #[arg(long, value_parser = parse_byte_size, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: u64,

        /// Digits in the chunk index
        #[arg(long, default_value_t = DEFAULT_INDEX_WIDTH)]
        index_width: usize,

        /// Write chunks here instead of beside the file
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Combine the .part chunks in a directory
    Combine {
        /// Directory holding the chunks
        dir: PathBuf,

        /// Output file (defaults to <dir>/<stem>.<extension>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extension for the inferred output file
        #[arg(long, default_value = DEFAULT_OUTPUT_EXTENSION)]
        extension: String,

        /// Only combine chunks of this original file
        #[arg(long)]
        stem: Option<String>,

        /// Skip missing chunks instead of failing
        #[arg(long)]
        allow_gaps: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Command::Split {
            file,
            chunk_size,
            index_width,
            output_dir,
        } => {
            let options = SplitOptions {
                chunk_size,
                index_width,
                output_dir,
            };
            let parts = split_file(&file, &options)?;
            println!("Split {} into {} part(s)", file.display(), parts.len());
        }
        Command::Combine {
            dir,
            output,
            extension,
            stem,
            allow_gaps,
        } => {
            let options = CombineOptions {
                output,
                extension,
                stem,
                allow_gaps,
            };
            let output = combine_files_from_directory(&dir, &options)?;
            println!("Combined into {}", output.display());
        }
    }

    Ok(())
}
