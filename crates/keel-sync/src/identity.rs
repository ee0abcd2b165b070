use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Identity of one external build: the canonical root directory of its
/// project hierarchy.
///
/// Equality, ordering, and hashing consider only the root directory. The
/// display name is presentation metadata (thread names, log fields, error
/// messages) and never part of the identity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BuildIdentity {
    root_dir: PathBuf,
    display_name: String,
}

impl BuildIdentity {
    /// Identity named after the root directory's last segment.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let display_name = root_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_dir.display().to_string());
        Self {
            root_dir,
            display_name,
        }
    }

    pub fn named(root_dir: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            display_name: display_name.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl PartialEq for BuildIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.root_dir == other.root_dir
    }
}

impl Eq for BuildIdentity {}

impl Hash for BuildIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root_dir.hash(state);
    }
}

impl PartialOrd for BuildIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BuildIdentity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.root_dir.cmp(&other.root_dir)
    }
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_not_part_of_the_identity() {
        let plain = BuildIdentity::new("/work/app");
        let renamed = BuildIdentity::named("/work/app", "My App");
        assert_eq!(plain, renamed);
        assert_eq!(plain.display_name(), "app");
        assert_eq!(renamed.to_string(), "My App");
    }

    #[test]
    fn identities_with_different_roots_differ() {
        assert_ne!(BuildIdentity::new("/work/a"), BuildIdentity::new("/work/b"));
    }
}
