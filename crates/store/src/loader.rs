use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::value::type_name;
use crate::Document;

/// Decompresses a gzip archive and parses it as a JSON object.
pub fn load_bundle(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    log::info!("Loading data from {}...", path.display());

    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    log::info!(
        "Successfully decompressed. Content size: {} bytes",
        decompressed.len()
    );

    let document = parse_document(&decompressed)?;
    log::info!("Successfully parsed content as JSON ({} keys)", document.len());
    Ok(document)
}

pub fn parse_document(bytes: &[u8]) -> Result<Document> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object at the root, got {}",
            type_name(&other)
        ))),
    }
}
