use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Hierarchical path identifying one project within a build model tree,
/// rendered `:` for the root and `:sub:module` below it.
///
/// Paths are the identity key wherever nodes are deduplicated. The total
/// order puts shallower paths first; equal depth compares segment-wise, so the
/// root sorts before everything else and siblings sort by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectPath {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("project path `{0}` must start with `:`")]
    MissingLeadingColon(String),

    #[error("project path `{0}` contains an empty segment")]
    EmptySegment(String),
}

impl ProjectPath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        let Some(rest) = text.strip_prefix(':') else {
            return Err(PathParseError::MissingLeadingColon(text.to_string()));
        };
        if rest.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in rest.split(':') {
            if segment.is_empty() {
                return Err(PathParseError::EmptySegment(text.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<ProjectPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(ProjectPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, segment: &str) -> ProjectPath {
        debug_assert!(!segment.is_empty() && !segment.contains(':'));
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        ProjectPath { segments }
    }

    /// True if `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &ProjectPath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl Ord for ProjectPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments
            .len()
            .cmp(&other.segments.len())
            .then_with(|| self.segments.cmp(&other.segments))
    }
}

impl PartialOrd for ProjectPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(":");
        }
        for segment in &self.segments {
            write!(f, ":{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ProjectPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ProjectPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ProjectPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ProjectPath::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> ProjectPath {
        ProjectPath::parse(text).unwrap()
    }

    #[test]
    fn parses_root_and_nested_paths() {
        assert!(path(":").is_root());
        assert_eq!(path(":").depth(), 0);
        assert_eq!(path(":a:b").segments(), ["a", "b"]);
        assert_eq!(path(":a:b").name(), Some("b"));
        assert_eq!(path(":a:b").to_string(), ":a:b");
        assert_eq!(path(":").to_string(), ":");
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            ProjectPath::parse("app"),
            Err(PathParseError::MissingLeadingColon(_))
        ));
        assert!(matches!(
            ProjectPath::parse(":a::b"),
            Err(PathParseError::EmptySegment(_))
        ));
        assert!(matches!(
            ProjectPath::parse("::"),
            Err(PathParseError::EmptySegment(_))
        ));
    }

    #[test]
    fn orders_by_depth_then_segments() {
        let mut paths = vec![path(":a:b"), path(":b"), path(":"), path(":a")];
        paths.sort();
        let rendered: Vec<String> = paths.iter().map(ProjectPath::to_string).collect();
        assert_eq!(rendered, [":", ":a", ":b", ":a:b"]);
    }

    #[test]
    fn parent_and_child_navigation() {
        assert_eq!(path(":a:b").parent(), Some(path(":a")));
        assert_eq!(path(":a").parent(), Some(path(":")));
        assert_eq!(path(":").parent(), None);
        assert_eq!(path(":a").child("b"), path(":a:b"));
        assert_eq!(path(":").child("a"), path(":a"));
    }

    #[test]
    fn contains_covers_self_and_descendants() {
        assert!(path(":").contains(&path(":a:b")));
        assert!(path(":a").contains(&path(":a")));
        assert!(path(":a").contains(&path(":a:b")));
        assert!(!path(":a").contains(&path(":b")));
        assert!(!path(":a:b").contains(&path(":a")));
    }

    #[test]
    fn serializes_as_string_form() {
        let json = serde_json::to_string(&path(":a:b")).unwrap();
        assert_eq!(json, "\":a:b\"");
        let back: ProjectPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path(":a:b"));
        assert!(serde_json::from_str::<ProjectPath>("\"a:b\"").is_err());
    }
}
