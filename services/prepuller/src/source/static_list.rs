//! Static image list mounted into the pod (usually from a ConfigMap).

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::PrepullError;
use crate::image::ImageReference;

/// Read the static image list at `path`.
///
/// Returns `Ok(None)` when no regular file exists there, which means cluster
/// discovery should run instead. Lines are trimmed and blank lines skipped;
/// duplicates are kept because they count towards ranking.
pub fn read_static_list(path: &Path) -> Result<Option<Vec<ImageReference>>, PrepullError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(None),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PrepullError::StaticListUnreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    info!(path = %path.display(), "Reading images from static list");

    let contents = fs::read_to_string(path).map_err(|source| PrepullError::StaticListUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(parse_static_list(&contents)))
}

fn parse_static_list(contents: &str) -> Vec<ImageReference> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ImageReference::from)
        .collect()
}
