use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Reads a JSON document. A missing file is not an error.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::io(format!("reading {}", path.display()), err)),
    };
    Ok(Some(serde_json::from_str(&data)?))
}

/// Writes a JSON document through a temp file in the same directory, so a
/// crash never leaves a half-written file behind.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let serialized = serde_json::to_vec_pretty(value)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|err| StoreError::io(format!("creating {}", parent.display()), err))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|err| StoreError::io(format!("creating temp file in {}", parent.display()), err))?;
    temp.write_all(&serialized)
        .map_err(|err| StoreError::io(format!("writing temp file for {}", path.display()), err))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| StoreError::io(format!("syncing temp file for {}", path.display()), err))?;
    temp.persist(path)
        .map_err(|err| StoreError::io(format!("renaming temp file to {}", path.display()), err.error))?;
    Ok(())
}
