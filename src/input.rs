//! Session response file loading.
//!
//! Accepts either a bare JSON array of response records or an object with a
//! `responses` array (the shape the session store exports).

use crate::error::InputError;
use crate::models::ResponseRecord;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum SessionFile {
    Bare(Vec<ResponseRecord>),
    Wrapped { responses: Vec<ResponseRecord> },
}

/// Parse session JSON. An empty response list is rejected.
pub fn parse_responses(content: &str) -> Result<Vec<ResponseRecord>, InputError> {
    let responses = match serde_json::from_str::<SessionFile>(content) {
        Ok(SessionFile::Bare(responses)) | Ok(SessionFile::Wrapped { responses }) => responses,
        // Untagged errors are uninformative; re-parse as a bare list for the real cause
        Err(_) => serde_json::from_str::<Vec<ResponseRecord>>(content)?,
    };

    if responses.is_empty() {
        return Err(InputError::EmptySession);
    }
    Ok(responses)
}

/// Read and parse a session file.
pub fn load_responses_from_file(path: &Path) -> Result<Vec<ResponseRecord>, InputError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            InputError::FileNotFound(path.display().to_string())
        } else {
            InputError::IoError(e)
        }
    })?;
    let responses = parse_responses(&content)?;
    log::debug!(
        "Loaded {} responses from {}",
        responses.len(),
        path.display()
    );
    Ok(responses)
}
