//! Artifact emitter
//!
//! Writes rendered text to disk, optionally runs an external formatter over
//! it, and reports where the artifact landed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::codegen::OutputFormat;
use crate::config::FormatterConfig;
use crate::error::{CodegenError, Result};

/// What was written
#[derive(Debug, Clone, Serialize)]
pub struct EmitReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub checksum: Checksum,
    /// Whether the formatter ran successfully over the artifact
    pub formatted: bool,
}

/// Output path with the format's extension appended when it has none
pub fn artifact_path(output: &Path, format: OutputFormat) -> PathBuf {
    if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.with_extension(format.extension())
    }
}

/// Write an artifact, then format it if a formatter is given.
///
/// A formatter that cannot be spawned or exits non-zero leaves the
/// unformatted artifact in place and is only logged.
pub fn write_artifact(
    output: &Path,
    format: OutputFormat,
    content: &str,
    formatter: Option<&FormatterConfig>,
) -> Result<EmitReport> {
    let path = artifact_path(output, format);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
    }
    fs::write(&path, content).map_err(|e| CodegenError::io(&path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote artifact");

    let formatted = match formatter {
        Some(formatter) => match run_formatter(formatter, &path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "formatter failed; keeping unformatted artifact");
                false
            }
        },
        None => false,
    };

    // the formatter may have rewritten the file
    let written = if formatted {
        fs::read(&path).map_err(|e| CodegenError::io(&path, e))?
    } else {
        content.as_bytes().to_vec()
    };

    let report = EmitReport {
        bytes: written.len() as u64,
        checksum: Checksum::from_bytes(&written),
        path,
        formatted,
    };
    info!(
        path = %report.path.display(),
        bytes = report.bytes,
        checksum = report.checksum.short(),
        "emitted artifact"
    );
    Ok(report)
}

/// Run `command args... <path>`
pub fn run_formatter(formatter: &FormatterConfig, path: &Path) -> Result<()> {
    let output = Command::new(&formatter.command)
        .args(&formatter.args)
        .arg(path)
        .output()
        .map_err(|e| CodegenError::Formatter(format!("could not run '{}': {}", formatter.command, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CodegenError::Formatter(format!(
            "'{}' exited with {}: {}",
            formatter.command,
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
