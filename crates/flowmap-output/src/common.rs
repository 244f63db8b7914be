use std::fs;
use std::path::Path;

use crate::error::{OutputError, Result};

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::io(parent, source))?;
    }
    Ok(())
}

pub(crate) fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, text).map_err(|source| OutputError::io(path, source))
}
