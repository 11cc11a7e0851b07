use log::{debug, info};
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

use super::types::JobGraph;
use crate::config::OutputFormat;
use crate::error::Result;

/// Renders the job graph in the requested format.
pub fn render(graph: &JobGraph, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(graph)?,
        OutputFormat::Json => serde_json::to_string_pretty(graph)?,
    };
    Ok(rendered)
}

/// Writes the job graph to `path` and returns its size on disk in bytes.
///
/// Missing parent directories are created. The document is written to a
/// temporary file next to `path` and then renamed over it, so readers never
/// observe a partially written file.
pub fn write_job_graph(graph: &JobGraph, format: OutputFormat, path: &Path) -> Result<u64> {
    let contents = render(graph, format)?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if !parent.exists() {
        debug!("Creating output directory {}", parent.display());
        std::fs::create_dir_all(parent)?;
    }

    let mut staging = staging_file(parent, path)?;
    staging.write_all(contents.as_bytes())?;
    staging.as_file().sync_all()?;
    staging.persist(path)?;

    let size = std::fs::metadata(path)?.len();
    info!("Job graph written to: {} ({size} bytes)", path.display());

    Ok(size)
}

/// Temporary file next to `target` carrying the mode the final file should have.
///
/// An existing target keeps its permissions. A new file gets `0o666` filtered
/// through the process umask, the same as a plain `fs::write`.
fn staging_file(parent: &Path, target: &Path) -> Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".gendag-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let staging = builder.tempfile_in(parent)?;
    if let Ok(existing) = std::fs::metadata(target) {
        staging.as_file().set_permissions(existing.permissions())?;
    }

    Ok(staging)
}
