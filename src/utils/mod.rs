pub mod clock;

use std::path::{Path, PathBuf};
use which::which;

/// Resolves an external tool: the explicitly configured path wins, otherwise PATH lookup.
pub fn find_tool(explicit: Option<&Path>, name: &str) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| which(name).ok())
}

/// Writes an executable shell script standing in for an external tool.
#[cfg(all(test, unix))]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}", body))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
