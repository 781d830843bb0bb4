use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ClearCacheError {
    #[error("could not remove cache contents at {path:?}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("could not recreate cache directory at {path:?}")]
    Recreate { path: PathBuf, source: io::Error },
}

/// Wipe the directory at `path`, then recreate it empty.
///
/// A missing `path` is not an error. Recreation is attempted even when
/// removal fails, so the directory exists afterward whenever the
/// filesystem allows it. The caller decides whether a failure aborts
/// the run.
#[instrument(level = "trace", skip_all)]
pub fn execute(path: &Path) -> Result<(), ClearCacheError> {
    info!("Clearing cache at {:?}...", path);

    let removed = match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ClearCacheError::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    };

    fs::create_dir_all(path).map_err(|e| ClearCacheError::Recreate {
        path: path.to_path_buf(),
        source: e,
    })?;
    removed?;

    info!("Done clearing cache at {:?}.", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_nonempty_directory_but_keeps_it() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("cache");
        fs::create_dir_all(cache.join("sub")).unwrap();
        fs::write(cache.join("stale.html"), b"stale").unwrap();
        fs::write(cache.join("sub").join("stale.css"), b"stale").unwrap();

        execute(&cache).unwrap();

        assert!(cache.is_dir());
        assert!(fs::read_dir(&cache).unwrap().next().is_none());
    }

    #[test]
    fn creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("never-existed");

        execute(&cache).unwrap();

        assert!(cache.is_dir());
        assert!(fs::read_dir(&cache).unwrap().next().is_none());
    }

    #[test]
    fn reports_error_when_path_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("cache");
        fs::write(&cache, b"not a directory").unwrap();

        let result = execute(&cache);

        assert!(result.is_err());
        assert!(cache.is_file());
    }
}
