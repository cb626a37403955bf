//! Fallback instance identifier taken from the local machine id.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};

pub const MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Read the machine id stored at `path`, without surrounding whitespace.
pub fn read(path: &Path) -> anyhow::Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading machine ID from {}", path.display()))?;
    let id = raw.trim();
    if id.is_empty() {
        bail!("machine ID file {} is empty", path.display());
    }
    Ok(id.to_string())
}
