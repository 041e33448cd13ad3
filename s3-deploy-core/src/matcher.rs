//! Expands the source glob into the list of files to upload.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::error::DeployError;

/// All paths matching `include` that are not matched by any of `exclude`.
///
/// Order follows the traversal of the inclusion pattern. Exclusions are compared
/// by exact path, so an exclusion only removes what it would itself expand to.
/// A trailing `**` matches files at any depth below it. Directories are not
/// filtered here.
pub fn match_files(include: &str, exclude: &[String]) -> Result<Vec<PathBuf>, DeployError> {
    let matches = expand(include)?;
    if exclude.is_empty() {
        info!(pattern = include, count = matches.len(), "Matched files");
        return Ok(matches);
    }

    let mut excluded: HashSet<PathBuf> = HashSet::new();
    for pattern in exclude {
        excluded.extend(expand(pattern)?);
    }

    let included: Vec<PathBuf> = matches
        .into_iter()
        .filter(|path| !excluded.contains(path))
        .collect();

    info!(
        pattern = include,
        excluded = excluded.len(),
        count = included.len(),
        "Matched files"
    );
    Ok(included)
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>, DeployError> {
    let paths = glob::glob(&match_below(pattern)).map_err(|e| {
        error!(pattern, error = %e, "Could not match files");
        DeployError::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }
    })?;

    Ok(paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(path = %e.path().display(), error = %e, "Skipping unreadable path");
                None
            }
        })
        .collect())
}

/// `glob` only yields directories for a trailing `**`; append `/*` so the
/// pattern reaches every entry below it.
fn match_below(pattern: &str) -> Cow<'_, str> {
    if pattern == "**" || pattern.ends_with("/**") {
        Cow::Owned(format!("{pattern}/*"))
    } else {
        Cow::Borrowed(pattern)
    }
}
