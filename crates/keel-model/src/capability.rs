/// A version-gated value from the external build tool.
///
/// Old tool versions cannot answer every query; `Unsupported` records that the
/// attribute predates the tool, which is a different fact from the tool
/// reporting an empty collection. The two must never be conflated:
/// `Reported(vec![])` means "the tool said there are none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Capability<T> {
    Unsupported,
    Reported(T),
}

impl<T> Capability<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Reported(_))
    }

    pub fn reported(&self) -> Option<&T> {
        match self {
            Capability::Unsupported => None,
            Capability::Reported(value) => Some(value),
        }
    }

    pub fn into_reported(self) -> Option<T> {
        match self {
            Capability::Unsupported => None,
            Capability::Reported(value) => Some(value),
        }
    }

    pub fn as_ref(&self) -> Capability<&T> {
        match self {
            Capability::Unsupported => Capability::Unsupported,
            Capability::Reported(value) => Capability::Reported(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Capability::Unsupported => Capability::Unsupported,
            Capability::Reported(value) => Capability::Reported(f(value)),
        }
    }
}

impl<T> Default for Capability<T> {
    fn default() -> Self {
        Capability::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_distinct_from_reported_empty() {
        let unsupported: Capability<Vec<String>> = Capability::Unsupported;
        let empty: Capability<Vec<String>> = Capability::Reported(Vec::new());
        assert_ne!(unsupported, empty);
        assert!(!unsupported.is_supported());
        assert!(empty.is_supported());
        assert_eq!(empty.reported().map(Vec::len), Some(0));
    }

    #[test]
    fn map_preserves_the_unsupported_state() {
        let absent: Capability<u32> = Capability::Unsupported;
        assert_eq!(absent.map(|n| n + 1), Capability::Unsupported);
        assert_eq!(Capability::Reported(1).map(|n| n + 1), Capability::Reported(2));
    }
}
