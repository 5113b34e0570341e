//! Listing candidate files in the source directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File name as listed in the directory
    pub name: OsString,
    /// File size in bytes
    pub size: u64,
}

/// Lists the immediate file entries of a directory.
pub struct FileDiscovery;

impl FileDiscovery {
    /// List regular files directly inside `dir`, sorted by name.
    ///
    /// Subdirectories are skipped and not descended into. Entries that vanish
    /// or cannot be stat'ed while listing are dropped with a debug log; only a
    /// failure to open `dir` itself is an error.
    pub fn list(dir: &Path) -> PipelineResult<Vec<DiscoveredFile>> {
        let list_err = |source| PipelineError::ListDir {
            path: dir.to_path_buf(),
            source,
        };
        // WalkDir yields nothing past depth 0 for a plain file.
        let meta = std::fs::metadata(dir).map_err(list_err)?;
        if !meta.is_dir() {
            return Err(list_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory loop"));
                    return Err(list_err(source));
                }
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            match entry.metadata() {
                Ok(meta) if !meta.is_dir() => files.push(DiscoveredFile {
                    path: entry.path().to_path_buf(),
                    name: entry.file_name().to_os_string(),
                    size: meta.len(),
                }),
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping {:?}: {}", entry.path(), e),
            }
        }

        Ok(files)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

/// Output path for a source file: `<target_dir>/<name>.<extension>`.
pub fn target_path(target_dir: &Path, name: &std::ffi::OsStr, extension: &str) -> PathBuf {
    let mut file_name = name.to_os_string();
    file_name.push(".");
    file_name.push(extension);
    target_dir.join(file_name)
}
