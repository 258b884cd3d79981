//! Artifact copying
//!
//! File operations used while assembling the distribution. A missing source
//! is always an error. Directory scans run on the blocking thread pool.

use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::BuildError;

/// Create a directory and its parents; succeeds if it already exists
pub async fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| BuildError::io(path, e))
}

async fn require_exists(path: &Path) -> Result<std::fs::Metadata, BuildError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BuildError::MissingSource(path.to_path_buf())),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

async fn copy_file(src: &Path, dest: &Path) -> Result<(), BuildError> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent).await?;
    }
    tokio::fs::copy(src, dest)
        .await
        .map_err(|e| BuildError::io(src, e))?;
    Ok(())
}

/// Copy `src_dir/name` to `dest_dir/name`; directories are copied recursively
pub async fn copy_entry(src_dir: &Path, dest_dir: &Path, name: &str) -> Result<(), BuildError> {
    let src = src_dir.join(name);
    let dest = dest_dir.join(name);
    let meta = require_exists(&src).await?;

    debug!("Copying {:?} -> {:?}", src, dest);
    if meta.is_dir() {
        copy_tree(&src, &dest, |_, _| true).await?;
    } else {
        copy_file(&src, &dest).await?;
    }
    Ok(())
}

/// Copy several entries with [`copy_entry`]
pub async fn copy_entries(src_dir: &Path, dest_dir: &Path, names: &[&str]) -> Result<(), BuildError> {
    for name in names {
        copy_entry(src_dir, dest_dir, name).await?;
    }
    Ok(())
}

/// Copy a text file, replacing every occurrence of each key with its value
pub async fn copy_and_substitute(
    src_dir: &Path,
    dest_dir: &Path,
    name: &str,
    substitutions: &[(&str, &str)],
) -> Result<(), BuildError> {
    let src = src_dir.join(name);
    let dest = dest_dir.join(name);
    require_exists(&src).await?;

    let mut contents = tokio::fs::read_to_string(&src)
        .await
        .map_err(|e| BuildError::io(&src, e))?;
    for (key, value) in substitutions {
        contents = contents.replace(key, value);
    }

    ensure_dir(dest_dir).await?;
    tokio::fs::write(&dest, contents)
        .await
        .map_err(|e| BuildError::io(&dest, e))
}

/// Copy every file under `src_root` matching `pattern` (relative to
/// `src_root`, e.g. `**/*.h`) into `dest_root`, keeping relative paths.
///
/// Returns the number of files copied.
pub async fn glob_copy(pattern: &str, src_root: &Path, dest_root: &Path) -> Result<usize, BuildError> {
    require_exists(src_root).await?;

    let root = src_root.to_path_buf();
    let pattern_owned = pattern.to_string();
    let matches = blocking_scan(src_root, move || glob_files(&pattern_owned, &root)).await??;

    for (from, relative) in &matches {
        copy_file(from, &dest_root.join(relative)).await?;
    }

    debug!("Copied {} files matching {:?} from {:?}", matches.len(), pattern, src_root);
    Ok(matches.len())
}

/// Matching files with their paths relative to `src_root`
fn glob_files(pattern: &str, src_root: &Path) -> Result<Vec<(PathBuf, PathBuf)>, BuildError> {
    let root = glob::Pattern::escape(&src_root.to_string_lossy());
    let full_pattern = format!("{}/{}", root.trim_end_matches(['/', '\\']), pattern);
    let entries = glob::glob(&full_pattern).map_err(|source| BuildError::InvalidPattern {
        pattern: full_pattern.clone(),
        source,
    })?;

    // glob drops a leading `.` from the paths it yields
    let prefix = without_cur_dir(src_root);
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            BuildError::io(path, e.into())
        })?;
        if !path.is_file() {
            continue;
        }
        let relative = without_cur_dir(&path)
            .strip_prefix(&prefix)
            .map_err(|_| BuildError::OutsideRoot {
                path: path.clone(),
                root: src_root.to_path_buf(),
            })?
            .to_path_buf();
        files.push((path, relative));
    }
    Ok(files)
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Run a directory scan off the async worker threads
async fn blocking_scan<T, F>(root: &Path, scan: F) -> Result<T, BuildError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(scan)
        .await
        .map_err(|e| BuildError::io(root, std::io::Error::other(e)))
}

/// Copy a directory tree, keeping only entries accepted by `filter`.
///
/// The filter receives each entry's path and whether it is a directory.
/// Rejected directories are not descended into. Returns the number of files
/// copied.
pub async fn copy_tree<F>(src: &Path, dest: &Path, filter: F) -> Result<usize, BuildError>
where
    F: Fn(&Path, bool) -> bool + Send + 'static,
{
    require_exists(src).await?;
    ensure_dir(dest).await?;

    let root = src.to_path_buf();
    let (dirs, files) = blocking_scan(src, move || walk_tree(&root, filter)).await??;

    for relative in &dirs {
        ensure_dir(&dest.join(relative)).await?;
    }
    for (from, relative) in &files {
        copy_file(from, &dest.join(relative)).await?;
    }
    Ok(files.len())
}

type TreeListing = (Vec<PathBuf>, Vec<(PathBuf, PathBuf)>);

/// Accepted directories and files under `src`, relative to it
fn walk_tree<F>(src: &Path, filter: F) -> Result<TreeListing, BuildError>
where
    F: Fn(&Path, bool) -> bool,
{
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    let walker = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || filter(e.path(), e.file_type().is_dir()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            BuildError::io(path, source)
        })?;
        if entry.depth() == 0 {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| BuildError::OutsideRoot {
                path: entry.path().to_path_buf(),
                root: src.to_path_buf(),
            })?
            .to_path_buf();
        if entry.file_type().is_dir() {
            dirs.push(relative);
        } else {
            files.push((entry.path().to_path_buf(), relative));
        }
    }
    Ok((dirs, files))
}

/// Filter accepting every directory and files whose name ends with
/// `extension` (case-insensitive, e.g. `".so"`)
pub fn directories_and_extension(extension: &str) -> impl Fn(&Path, bool) -> bool {
    let extension = extension.to_lowercase();
    move |path, is_dir| {
        is_dir
            || path
                .file_name()
                .map(|name| name.to_string_lossy().to_lowercase().ends_with(&extension))
                .unwrap_or(false)
    }
}
