//! Resolution of user-supplied binary references to existing files.

use crate::ExecError;
use std::env;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, info};

/// Turns a binary reference into a concrete filesystem path.
///
/// Order: the path as given, then (bare file names only) the working directory
/// followed by the user's home directory. A reference containing a separator is
/// authoritative and never re-interpreted against the fallback directories.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    fallback_dirs: Option<Vec<PathBuf>>,
}

impl PathResolver {
    /// Resolver probing the process working directory and home directory at call time.
    pub fn from_environment() -> Self {
        Self::default()
    }

    /// Resolver probing a fixed list of directories, in order.
    pub fn with_fallback_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            fallback_dirs: Some(dirs),
        }
    }

    pub fn resolve(&self, reference: &str) -> Result<PathBuf, ExecError> {
        if reference.is_empty() {
            return Err(ExecError::FileNotFound {
                reference: reference.to_string(),
            });
        }

        let as_given = Path::new(reference);
        if as_given.exists() {
            info!(path = %as_given.display(), "binary file has been found");
            return Ok(as_given.to_path_buf());
        }

        if has_separator(reference) {
            debug!(reference, "explicit path does not exist");
            return Err(ExecError::FileNotFound {
                reference: reference.to_string(),
            });
        }

        for dir in self.fallback_dirs() {
            let candidate = dir.join(reference);
            if candidate.exists() {
                info!(path = %candidate.display(), "full path of binary file resolved");
                return Ok(candidate);
            }
        }

        Err(ExecError::FileNotFound {
            reference: reference.to_string(),
        })
    }

    fn fallback_dirs(&self) -> Vec<PathBuf> {
        match &self.fallback_dirs {
            Some(dirs) => dirs.clone(),
            None => env::current_dir()
                .ok()
                .into_iter()
                .chain(dirs::home_dir())
                .collect(),
        }
    }
}

/// Anchor a relative path at the process working directory.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Fail unless at least one execute bit is set on `path`.
///
/// Elevated posix runs go through `sh`, which would read the script regardless of
/// its mode, so the bit is checked up front.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> Result<(), ExecError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = path.metadata().map_err(|_| ExecError::FileNotFound {
        reference: path.display().to_string(),
    })?;
    if metadata.permissions().mode() & 0o111 == 0 {
        debug!(path = %path.display(), "binary file has no execute permission");
        return Err(ExecError::NotExecutable {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_executable(_path: &Path) -> Result<(), ExecError> {
    Ok(())
}

fn has_separator(reference: &str) -> bool {
    reference.contains('/') || reference.contains(MAIN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "#!/bin/sh\n").unwrap();
    }

    #[test]
    fn existing_absolute_path_is_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("list.sh");
        touch(&script);

        let resolver = PathResolver::with_fallback_dirs(vec![]);
        let resolved = resolver.resolve(script.to_str().unwrap()).unwrap();
        assert_eq!(resolved, script);
    }

    #[test]
    fn missing_explicit_path_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ghost.sh"));

        let resolver = PathResolver::with_fallback_dirs(vec![dir.path().to_path_buf()]);
        let err = resolver.resolve("missing/ghost.sh").unwrap_err();
        assert!(matches!(err, ExecError::FileNotFound { .. }));
    }

    #[test]
    fn bare_name_probes_fallback_dirs_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let name = format!("resolver-order-{}.sh", uuid::Uuid::new_v4());
        touch(&first.path().join(&name));
        touch(&second.path().join(&name));

        let resolver = PathResolver::with_fallback_dirs(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(resolver.resolve(&name).unwrap(), first.path().join(&name));
    }

    #[test]
    fn bare_name_found_only_in_later_dir() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let name = format!("resolver-home-{}.sh", uuid::Uuid::new_v4());
        touch(&second.path().join(&name));

        let resolver = PathResolver::with_fallback_dirs(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(resolver.resolve(&name).unwrap(), second.path().join(&name));
    }

    #[test]
    fn unknown_bare_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::with_fallback_dirs(vec![dir.path().to_path_buf()]);
        let name = format!("nowhere-{}.sh", uuid::Uuid::new_v4());
        assert!(matches!(
            resolver.resolve(&name),
            Err(ExecError::FileNotFound { reference }) if reference == name
        ));
    }

    #[test]
    fn empty_reference_is_not_found() {
        let resolver = PathResolver::from_environment();
        assert!(matches!(
            resolver.resolve(""),
            Err(ExecError::FileNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn ensure_executable_checks_mode_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("protected.sh");
        touch(&script);

        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            ensure_executable(&script),
            Err(ExecError::NotExecutable { path }) if path == script
        ));

        fs::set_permissions(&script, fs::Permissions::from_mode(0o744)).unwrap();
        assert!(ensure_executable(&script).is_ok());

        assert!(matches!(
            ensure_executable(&dir.path().join("gone.sh")),
            Err(ExecError::FileNotFound { .. })
        ));
    }

    #[test]
    fn absolutize_anchors_relative_paths() {
        let relative = Path::new("scripts/list.sh");
        let absolute = absolutize(relative).unwrap();
        assert!(absolute.is_absolute());
        assert!(absolute.ends_with("scripts/list.sh"));

        let already = env::temp_dir();
        assert_eq!(absolutize(&already).unwrap(), already);
    }
}
