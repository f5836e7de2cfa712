//! On-disk form of the storage table.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::metadata::{StorageMetadata, MINIMUM_STORAGE_FILE_VERSION, STORAGE_FILE_VERSION};
use super::record::Record;
use super::table::StorageTable;
use crate::error::{Result, StorageError};

/// Serialization used for a storage file, chosen by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    Yaml,
    Json,
}

impl StorageFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Root of a storage file: the record table and its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageDocument {
    #[serde(default)]
    pub data: StorageTable,
    #[serde(default)]
    pub metadata: StorageMetadata,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    data: &'a StorageTable,
    metadata: &'a StorageMetadata,
}

pub fn read_document(path: &Path) -> Result<StorageDocument> {
    let mut contents = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut contents)?;
    if contents.trim().is_empty() {
        return Ok(StorageDocument::default());
    }

    let document = match StorageFormat::for_path(path) {
        StorageFormat::Yaml => {
            let value: Value = serde_yaml::from_str(&contents)?;
            if value.is_null() {
                StorageDocument::default()
            } else {
                serde_json::from_value(value)?
            }
        }
        StorageFormat::Json => serde_json::from_str(&contents)?,
    };
    Ok(document)
}

/// Write the table and metadata to `path`, replacing the file only once the
/// new content is complete.
///
/// The content goes to a temporary file in the same directory which is then
/// renamed over `path`; on any error the temporary file is removed and the
/// previous file is left as it was.
pub fn write_document(path: &Path, data: &StorageTable, metadata: &StorageMetadata) -> Result<()> {
    let document = DocumentRef { data, metadata };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        match StorageFormat::for_path(path) {
            StorageFormat::Yaml => serde_yaml::to_writer(&mut writer, &document)?,
            StorageFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &document)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| StorageError::Io(err.error))?;
    Ok(())
}

/// Bring a freshly read document up to the current format version.
///
/// Returns whether the document was modified.
pub fn upgrade(document: &mut StorageDocument) -> Result<bool> {
    let found = document.metadata.version();
    let incompatible = StorageError::VersionIncompatible {
        found,
        minimum: MINIMUM_STORAGE_FILE_VERSION,
        current: STORAGE_FILE_VERSION,
    };

    if found > STORAGE_FILE_VERSION {
        return Err(incompatible);
    }
    if found >= MINIMUM_STORAGE_FILE_VERSION {
        return Ok(false);
    }

    match found {
        1 => {
            // Version 1 lists held bare outputs without record metadata.
            for node in document.data.as_map_mut().values_mut() {
                wrap_bare_outputs(node);
            }
            document.metadata.set_version(STORAGE_FILE_VERSION);
            tracing::debug!(from = found, to = STORAGE_FILE_VERSION, "upgraded storage file");
            Ok(true)
        }
        _ => Err(incompatible),
    }
}

fn wrap_bare_outputs(node: &mut Value) {
    if Record::from_node(node).is_some() {
        return;
    }
    match node {
        Value::Array(items) => {
            for item in items.iter_mut() {
                if Record::from_node(item).is_none() {
                    let output = std::mem::take(item);
                    *item = Record::bare(output).into_node();
                }
            }
        }
        Value::Object(map) => {
            for child in map.values_mut() {
                wrap_bare_outputs(child);
            }
        }
        _ => {}
    }
}
