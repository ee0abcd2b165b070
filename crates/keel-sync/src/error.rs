use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// One build's run terminated with status `Failed`.
    #[error("synchronization of `{build}` failed: {message}")]
    BuildFailed { build: String, message: String },

    #[error(transparent)]
    Aggregate(#[from] AggregateSyncError),
}

/// Every failure from a batch of independent runs.
///
/// A batch never collapses to "first error wins": each failed build
/// contributes its error, and callers can inspect the full list.
#[derive(Debug)]
pub struct AggregateSyncError {
    errors: Vec<SyncError>,
}

impl AggregateSyncError {
    /// Joins per-build failures: zero errors is success, exactly one
    /// propagates directly, several are wrapped together.
    pub fn collect(mut errors: Vec<SyncError>) -> Result<(), SyncError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(SyncError::Aggregate(AggregateSyncError { errors })),
        }
    }

    pub fn errors(&self) -> &[SyncError] {
        &self.errors
    }
}

impl fmt::Display for AggregateSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} synchronization runs failed", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateSyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(build: &str) -> SyncError {
        SyncError::BuildFailed {
            build: build.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn empty_collect_is_success() {
        assert!(AggregateSyncError::collect(Vec::new()).is_ok());
    }

    #[test]
    fn a_single_failure_propagates_directly() {
        let err = AggregateSyncError::collect(vec![failed("a")]).unwrap_err();
        assert!(matches!(err, SyncError::BuildFailed { ref build, .. } if build == "a"));
    }

    #[test]
    fn multiple_failures_are_all_listed() {
        let err = AggregateSyncError::collect(vec![failed("a"), failed("c")]).unwrap_err();
        let SyncError::Aggregate(aggregate) = err else {
            panic!("expected an aggregate error");
        };
        assert_eq!(aggregate.errors().len(), 2);
        let display = aggregate.to_string();
        assert!(display.starts_with("2 synchronization runs failed"));
        assert!(display.contains("`a`") && display.contains("`c`"));
    }
}
