use std::collections::HashSet;
use std::path::Path;
use std::time::SystemTime;

/// Modification time of a file.
pub fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Whether `artifact` must be rebuilt from `source`.
///
/// True when the artifact is missing or strictly older than the source.
pub fn is_stale(artifact: &Path, source: &Path) -> std::io::Result<bool> {
    if !artifact.exists() {
        return Ok(true);
    }
    Ok(modified_time(artifact)? < modified_time(source)?)
}

/// Names of the regular files directly inside `dir`.
pub fn list_file_names(dir: &Path) -> std::io::Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}
