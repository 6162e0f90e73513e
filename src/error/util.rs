//! Utility functions for error handling
//!
//! Path checks that turn filesystem problems into errors carrying the path
//! and the reason the path was needed.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Check that `path` is an existing, readable file
///
/// # Arguments
/// * `path` - The path to check
/// * `purpose` - Why the file is needed (for error context)
pub fn validate_input_file(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::load(path, format!("File not found (needed for: {purpose})")));
    }

    if !path.is_file() {
        return Err(Error::load(
            path,
            format!("Path is not a file (expected a file for: {purpose})"),
        ));
    }

    match fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            let reason = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check file permissions".to_string()
                }
                _ => format!("Failed to open file for {purpose}: {e}"),
            };
            Err(Error::load(path, reason))
        }
    }
}

/// Make sure an output directory exists, creating it if needed
pub fn ensure_output_directory(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Output path {} exists and is not a directory", path.display()),
        )));
    }

    fs::create_dir_all(path)?;
    Ok(())
}
