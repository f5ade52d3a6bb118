use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const LOG_FOLDER: &str = "portal-logs";

/// Resolve the folder the binary runs from (absolute path)
pub fn resolve_deployment_folder() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return dir.to_path_buf();
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve the log folder, creating it if needed.
///
/// An explicitly configured folder wins. Otherwise walk up from the working directory looking
/// for an existing `portal-logs/` or a workspace root (`Cargo.toml` with `[workspace]`), and
/// fall back to `portal-logs/` next to the binary.
pub fn resolve_log_folder(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        return ensure_dir(dir.to_path_buf());
    }

    if let Ok(mut dir) = std::env::current_dir() {
        for _ in 0..12 {
            let candidate = dir.join(LOG_FOLDER);
            if candidate.exists() {
                return Ok(candidate);
            }
            if is_workspace_root(&dir) {
                return ensure_dir(candidate);
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
    }

    ensure_dir(resolve_deployment_folder().join(LOG_FOLDER))
}

fn is_workspace_root(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("Cargo.toml"))
        .map(|manifest| manifest.contains("[workspace]"))
        .unwrap_or(false)
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log folder {}", dir.display()))?;
    Ok(dir)
}
