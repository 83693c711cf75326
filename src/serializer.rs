//! Serializer for rendering the schema model as Doctrine YAML.

use std::fs;
use std::io;
use std::path::Path;

use crate::schema::TargetSchema;

/// Serialize a schema to YAML. Keys follow insertion order.
pub fn to_yaml(schema: &TargetSchema) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(schema)
}

/// Write `contents` to `path`, replacing whatever file is already there.
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)
}
