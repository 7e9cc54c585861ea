mod cli;

use std::io::{self, BufWriter, Write};

use clap::Parser;

use safereplace::{AccessMode, StagedReplace, begin_replace};

use crate::cli::CliArgs;

const EXIT_USAGE: i32 = 1;
const EXIT_FAILURE: i32 = 2;

fn main() {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(EXIT_USAGE);
        }
    };
    std::process::exit(run(&args));
}

fn run(args: &CliArgs) -> i32 {
    if let Err(message) = args.validate() {
        eprintln!("safereplace: {message}");
        return EXIT_USAGE;
    }

    let mut staged = match begin_replace(&args.filename, AccessMode::WriteOnly, 0o666) {
        Ok(staged) => staged,
        Err(err) => {
            eprintln!("safereplace: failed to open file: {err}");
            return EXIT_FAILURE;
        }
    };

    if let Err(err) = write_lines(&mut staged, &args.string, args.count) {
        eprintln!("safereplace: failed to write file: {err}");
        return EXIT_FAILURE;
    }

    if let Err(err) = staged.commit_durable() {
        eprintln!("safereplace: failure while closing the file: {err}");
        return EXIT_FAILURE;
    }

    0
}

fn write_lines(staged: &mut StagedReplace, line: &str, count: u64) -> io::Result<()> {
    let mut writer = BufWriter::new(staged);
    for _ in 0..count {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use safereplace_test_support::TempWorkspace;

    fn args(filename: PathBuf, string: &str, count: u64) -> CliArgs {
        CliArgs {
            filename,
            string: string.to_string(),
            count,
        }
    }

    #[test]
    fn run_writes_repeated_lines() {
        let ws = TempWorkspace::new();
        let target = ws.path("out.txt");

        let code = run(&args(target.clone(), "hello", 3));
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello\nhello\nhello\n");
    }

    #[test]
    fn run_replaces_existing_file() {
        let ws = TempWorkspace::new();
        let target = ws.write_file("out.txt", "previous\n");

        let code = run(&args(target.clone(), "fresh", 1));
        assert_eq!(code, 0);
        assert_eq!(fs::read_to_string(&target).unwrap(), "fresh\n");
        assert!(!ws.path("out.txt.tmp").exists());
    }

    #[test]
    fn run_rejects_empty_output() {
        let ws = TempWorkspace::new();
        assert_eq!(run(&args(ws.path("out.txt"), "x", 0)), EXIT_USAGE);
        assert_eq!(run(&args(ws.path("out.txt"), "", 1)), EXIT_USAGE);
        assert!(!ws.path("out.txt").exists());
    }

    #[test]
    fn run_reports_open_failure() {
        let ws = TempWorkspace::new();
        let target = ws.path("no/such/dir/out.txt");
        assert_eq!(run(&args(target, "x", 1)), EXIT_FAILURE);
    }
}
