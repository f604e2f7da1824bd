//! URL list loading.

use crate::error::TitleFetchError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a newline-delimited URL list.
///
/// Every line becomes one entry, in file order. Nothing is trimmed,
/// filtered or validated: a blank line yields an empty string, which the
/// request worker later rejects on its own.
pub fn read_urls<P: AsRef<Path>>(path: P) -> Result<Vec<String>, TitleFetchError> {
    let path = path.as_ref();
    let to_error =
        |e: std::io::Error| TitleFetchError::file_error(path.to_string_lossy(), e.to_string());

    let file = File::open(path).map_err(to_error)?;
    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_error)
}
