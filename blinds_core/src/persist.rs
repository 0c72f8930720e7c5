//! Last known position between runs, stored as a small TOML file.

use std::path::Path;

use blinds_config::PersistedPosition;
use eyre::WrapErr;

use crate::atomic::write_atomic;
use crate::error::{CoverError, Result};

/// Read the saved position. A missing file is `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<PersistedPosition>> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no saved position");
            return Ok(None);
        }
        Err(e) => {
            return Err(eyre::Report::new(CoverError::Io(e.to_string())))
                .wrap_err_with(|| format!("read state {}", path.display()));
        }
    };
    let saved = blinds_config::load_state_toml(&text)
        .map_err(|e| eyre::Report::new(CoverError::Config(e.to_string())))
        .wrap_err_with(|| format!("parse state {}", path.display()))?;
    Ok(Some(saved.clamped()))
}

pub fn save(path: &Path, pos: &PersistedPosition) -> Result<()> {
    let text = toml::to_string(pos)
        .map_err(|e| eyre::Report::new(CoverError::Config(e.to_string())))?;
    write_atomic(path, text.as_bytes())
        .map_err(|e| eyre::Report::new(CoverError::Io(e.to_string())))
        .wrap_err_with(|| format!("write state {}", path.display()))?;
    tracing::debug!(path = %path.display(), position = pos.position, "position saved");
    Ok(())
}
