use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "safereplace",
    about = "Atomically replace <filename> with <count> repetitions of <string>"
)]
pub struct CliArgs {
    /// Target file to replace.
    pub filename: PathBuf,

    /// Line to write; a newline is appended to each repetition.
    pub string: String,

    /// Number of times the line is written.
    pub count: u64,
}

impl CliArgs {
    /// Arguments that parse but describe an empty file are usage errors.
    pub fn validate(&self) -> Result<(), String> {
        if self.string.is_empty() || self.count == 0 {
            return Err("cannot create an empty file".to_string());
        }
        Ok(())
    }
}
