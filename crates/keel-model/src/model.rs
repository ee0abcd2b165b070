use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::capability::Capability;
use crate::path::ProjectPath;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct JavaVersion(pub u16);

impl JavaVersion {
    pub const JAVA_8: JavaVersion = JavaVersion(8);
    pub const JAVA_11: JavaVersion = JavaVersion(11);
    pub const JAVA_17: JavaVersion = JavaVersion(17);
    pub const JAVA_21: JavaVersion = JavaVersion(21);

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // Build tools often report "1.8" for Java 8.
        let normalized = text.strip_prefix("1.").unwrap_or(text);
        normalized.parse::<u16>().ok().map(JavaVersion)
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Installed runtime the build compiles against, as reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JavaRuntime {
    pub name: String,
    pub home: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JavaSourceSettings {
    pub source_level: JavaVersion,
    /// Falls back to `source_level` when the tool predates the attribute.
    pub target_bytecode_level: JavaVersion,
    /// The core never substitutes the host JVM; resolving a live runtime is
    /// the workspace collaborator's concern.
    pub runtime: Capability<JavaRuntime>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AccessRuleKind {
    Accessible,
    Discouraged,
    Forbidden,
}

/// Access rule attached to a classpath entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessRule {
    pub kind: AccessRuleKind,
    pub pattern: String,
}

/// Free-form attribute attached to a classpath entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClasspathAttribute {
    pub name: String,
    pub value: String,
}

/// Dependency on another project of the same build.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectDependency {
    pub target: ProjectPath,
    pub exported: bool,
    pub access_rules: Vec<AccessRule>,
    pub attributes: Vec<ClasspathAttribute>,
}

impl ProjectDependency {
    pub fn new(target: ProjectPath) -> Self {
        Self {
            target,
            exported: false,
            access_rules: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// Dependency on an external artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExternalDependency {
    pub file: PathBuf,
    pub source: Option<PathBuf>,
    pub exported: bool,
    pub access_rules: Vec<AccessRule>,
    pub attributes: Vec<ClasspathAttribute>,
}

impl ExternalDependency {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            source: None,
            exported: false,
            access_rules: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// Source directory of a project, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceRoot {
    pub path: String,
    /// Per-root output, relative to the project directory.
    pub output: Option<String>,
    pub attributes: Vec<ClasspathAttribute>,
}

impl SourceRoot {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            output: None,
            attributes: Vec::new(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum LinkedResourceKind {
    File,
    Folder,
}

/// Resource surfaced inside a project but living outside its directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkedResource {
    pub name: String,
    pub kind: LinkedResourceKind,
    pub location: PathBuf,
}

/// Builder step recorded in a project descriptor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuildCommand {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl BuildCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_version_accepts_legacy_and_modern_forms() {
        assert_eq!(JavaVersion::parse("1.8"), Some(JavaVersion::JAVA_8));
        assert_eq!(JavaVersion::parse("17"), Some(JavaVersion::JAVA_17));
        assert_eq!(JavaVersion::parse(" 11 "), Some(JavaVersion::JAVA_11));
        assert_eq!(JavaVersion::parse(""), None);
        assert_eq!(JavaVersion::parse("banana"), None);
    }
}
