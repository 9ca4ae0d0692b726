//! YAML rendering and atomic file output for templates.

use super::Template;
use crate::error::{BackendFailure, Phase};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Render the template as YAML.
pub fn render(template: &Template) -> Result<String, BackendFailure> {
    serde_yaml::to_string(template).map_err(|e| BackendFailure::new(Phase::WriteTemplate, e))
}

/// Write the template to `path`, replacing any previous file in one step.
///
/// The document is written to a temporary file in the same directory and
/// renamed over `path`; on any failure `path` is left untouched.
pub fn write_template(template: &Template, path: &Path) -> Result<(), BackendFailure> {
    let fail = |e: &dyn std::fmt::Display| {
        log::warn!("Error writing template {}: {e}", path.display());
        BackendFailure::new(Phase::WriteTemplate, format!("{}: {e}", path.display()))
    };

    let text = render(template)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| fail(&e))?;
    file.write_all(text.as_bytes()).map_err(|e| fail(&e))?;
    file.flush().map_err(|e| fail(&e))?;
    file.persist(path).map_err(|e| fail(&e.error))?;

    log::info!("Wrote template {} ({} bytes)", path.display(), text.len());
    Ok(())
}
