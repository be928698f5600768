use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),
}

/// Write a tool result to stdout (default) or to a file.
#[instrument(skip(json), fields(bytes = json.len()))]
pub fn output(json: &str, output_path: Option<&Path>) -> Result<(), OutputError> {
    match output_path {
        None => {
            debug!("writing result to stdout");
            write_result(&mut std::io::stdout().lock(), json)
        }
        Some(path) => {
            debug!(path = %path.display(), "writing result to file");
            let mut file = std::fs::File::create(path)?;
            write_result(&mut file, json)
        }
    }
}

fn write_result(out: &mut impl Write, json: &str) -> Result<(), OutputError> {
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}
