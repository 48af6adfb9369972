use std::fmt;

/// Semantic version triple.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Backends are usable by this crate only if their major version matches
    /// [`INTERFACE_VERSION`].
    #[inline]
    pub fn is_compatible(self) -> bool {
        self.major == INTERFACE_VERSION.major
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version of the capability table described by [`Backend`](super::Backend).
pub const INTERFACE_VERSION: Version = Version::new(1, 0, 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_major_version_gates_compatibility() {
        assert!(Version::new(1, 7, 3).is_compatible());
        assert!(!Version::new(2, 0, 0).is_compatible());
        assert!(!Version::new(0, 9, 0).is_compatible());
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
    }
}
