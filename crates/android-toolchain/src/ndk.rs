//! Side-by-side NDK selection
//!
//! Since 2019 the SDK manager installs every NDK version into its own
//! directory under `<sdk>/ndk/<version>`. The newest version wins.

use std::cmp::Ordering;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::version::compare_tokens;

/// Directory holding side-by-side NDK installs, relative to the SDK root
pub const SIDE_BY_SIDE_DIR: &str = "ndk";

/// Single-version NDK directory used before side-by-side installs
pub const LEGACY_BUNDLE_DIR: &str = "ndk-bundle";

/// Sort directory names newest first
pub fn sort_newest_first(names: &mut [OsString]) {
    names.sort_by(|a, b| compare_names(b, a));
}

fn compare_names(a: &OsStr, b: &OsStr) -> Ordering {
    compare_tokens(a.to_str(), b.to_str())
}

/// Pick the highest-versioned subdirectory of a side-by-side directory.
///
/// Entries that are not directories are skipped. Returns `None` when no
/// subdirectory qualifies.
pub async fn select_newest(side_by_side: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(side_by_side).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name());
    }

    sort_newest_first(&mut names);

    for name in names {
        let candidate = side_by_side.join(&name);
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_dir() => {
                debug!("Selected side-by-side NDK {:?}", candidate);
                return Ok(Some(candidate));
            }
            _ => debug!("Skipping non-directory entry {:?}", candidate),
        }
    }

    Ok(None)
}
