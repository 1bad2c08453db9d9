//! CLI for bibtidy - Sort and canonicalize BibTeX bibliographies.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use bibtidy::{format_bibliography, parse_bibliography, sort_entries};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Sort and canonicalize BibTeX bibliographies
#[derive(Parser)]
#[command(name = "bibtidy")]
#[command(version)]
#[command(after_help = "\
Examples:
  bibtidy refs.bib > tidy.bib
  bibtidy refs.bib -o tidy.bib
  bibtidy refs.bib --keep-order
  cat refs.bib | bibtidy -

Entries are sorted by citation key and fields by name; the input file is
never modified.")]
struct Cli {
    /// Input BibTeX file (use '-' for stdin)
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep entries in their original order instead of sorting by citation key
    #[arg(long)]
    keep_order: bool,
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — input file not found / unreadable
    InputFile(String),
    /// Exit 11 — malformed bibliography
    Parse(String),
    /// Exit 15 — cannot write output file
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::InputFile(_) => 10,
            AppError::Parse(_) => 11,
            AppError::OutputFile(_) => 15,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
            AppError::Parse(msg) => {
                write!(
                    f,
                    "{}\n  hint: check the entry for unbalanced braces or quotes and a '@type{{key, ...}}' shape",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    tidy_command(&cli.input, cli.output.as_deref(), cli.keep_order)
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Canonicalize one bibliography file.
fn tidy_command(input: &Path, output: Option<&Path>, keep_order: bool) -> Result<(), AppError> {
    // 1. Read the BibTeX source (support '-' for stdin)
    let source = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        buf
    } else {
        fs::read_to_string(input)
            .map_err(|e| AppError::InputFile(format!("'{}': {}", input.display(), e)))?
    };

    // 2. Parse the whole document before emitting anything, so a malformed
    //    bibliography never produces truncated output
    let mut entries = parse_bibliography(&source).map_err(|e| AppError::Parse(e.to_string()))?;

    // 3. Sort entries by citation key (fields are always sorted by name)
    if !keep_order {
        sort_entries(&mut entries);
    }

    // 4. Serialize
    let result = format_bibliography(&entries);

    // 5. Write to file or stdout
    if let Some(output_path) = output {
        fs::write(output_path, &result)
            .map_err(|e| AppError::OutputFile(format!("'{}': {}", output_path.display(), e)))?;
        eprintln!(
            "canonicalized {} entr{}, wrote {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            output_path.display()
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", result)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    }

    Ok(())
}
