use crate::error::{ReleaseError, Result};
use std::fmt;
use std::str::FromStr;

/// Separator between the patch number and the candidate counter ("1.2.3rc2").
pub const CANDIDATE_SEPARATOR: &str = "rc";

/// Version of a managed repository: `major.minor.patch`, optionally a release
/// candidate of that version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Candidate counter, always >= 1 when present. `None` means a release.
    pub candidate: Option<u32>,
}

/// Component to increment during a bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl Version {
    /// Create a new release version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
            candidate: None,
        }
    }

    /// Create a release candidate version
    pub fn candidate(major: u32, minor: u32, patch: u32, candidate: u32) -> Self {
        Version {
            major,
            minor,
            patch,
            candidate: Some(candidate),
        }
    }

    /// Parse a version as declared in a manifest (e.g. "1.2.3" or "1.2.3rc2")
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn is_release(&self) -> bool {
        self.candidate.is_none()
    }

    pub fn is_candidate(&self) -> bool {
        self.candidate.is_some()
    }

    /// Git tag name for this version
    pub fn tag(&self) -> String {
        format!("v{}", self)
    }

    /// Move to the next release candidate.
    ///
    /// Without a component, a release starts candidates for its next patch and a
    /// candidate moves to the following candidate of the same version. With a
    /// component the number changes and the counter restarts at 1.
    ///
    /// Fails with `InvalidVersion` if a number would overflow; the version is
    /// left unchanged in that case.
    pub fn bump_candidate(&mut self, component: Option<VersionBump>) -> Result<()> {
        let mut next = *self;
        match self.default_component(component) {
            Some(component) => {
                next.increment(component)?;
                next.candidate = Some(1);
            }
            None => {
                let candidate = match self.candidate {
                    Some(c) => c.checked_add(1).ok_or_else(|| self.overflow())?,
                    None => 1,
                };
                next.candidate = Some(candidate);
            }
        }
        *self = next;
        Ok(())
    }

    /// Move to a release.
    ///
    /// Without a component, a candidate is promoted as-is and a release gets
    /// its patch incremented. With a component the candidate is dropped and
    /// the component is incremented.
    pub fn bump_release(&mut self, component: Option<VersionBump>) -> Result<()> {
        let mut next = *self;
        next.candidate = None;
        if let Some(component) = self.default_component(component) {
            next.increment(component)?;
        }
        *self = next;
        Ok(())
    }

    fn default_component(&self, component: Option<VersionBump>) -> Option<VersionBump> {
        match component {
            None if self.is_release() => Some(VersionBump::Patch),
            other => other,
        }
    }

    fn increment(&mut self, component: VersionBump) -> Result<()> {
        let original = *self;
        let bump = |n: u32| n.checked_add(1).ok_or_else(|| original.overflow());
        match component {
            VersionBump::Major => {
                self.major = bump(self.major)?;
                self.minor = 0;
                self.patch = 0;
            }
            VersionBump::Minor => {
                self.minor = bump(self.minor)?;
                self.patch = 0;
            }
            VersionBump::Patch => {
                self.patch = bump(self.patch)?;
            }
        }
        Ok(())
    }

    fn overflow(&self) -> ReleaseError {
        ReleaseError::version(format!("'{}' cannot be bumped any further", self))
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseError::version(format!(
                "'{}' - expected major.minor.patch",
                text
            )));
        }

        let number = |part: &str, name: &str| {
            part.parse::<u32>().map_err(|_| {
                ReleaseError::version(format!("'{}' has an invalid {} number", text, name))
            })
        };

        let major = number(parts[0], "major")?;
        let minor = number(parts[1], "minor")?;

        let (patch, candidate) = match parts[2].split_once(CANDIDATE_SEPARATOR) {
            Some((patch, candidate)) => {
                let candidate = number(candidate, "candidate")?;
                if candidate == 0 {
                    return Err(ReleaseError::version(format!(
                        "'{}' - candidate numbers start at 1",
                        text
                    )));
                }
                (number(patch, "patch")?, Some(candidate))
            }
            None => (number(parts[2], "patch")?, None),
        };

        Ok(Version {
            major,
            minor,
            patch,
            candidate,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(candidate) = self.candidate {
            write!(f, "{}{}", CANDIDATE_SEPARATOR, candidate)?;
        }
        Ok(())
    }
}

/// The kind of bump requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Release,
    Candidate,
    Major,
    Minor,
    Patch,
}

impl BumpKind {
    /// Whether this kind produces a release (as opposed to a candidate)
    pub fn is_release(&self) -> bool {
        !matches!(self, BumpKind::Candidate)
    }

    /// Apply the transition this kind stands for
    pub fn apply(&self, version: &mut Version) -> Result<()> {
        match self {
            BumpKind::Release => version.bump_release(None),
            BumpKind::Candidate => version.bump_candidate(None),
            BumpKind::Major => version.bump_release(Some(VersionBump::Major)),
            BumpKind::Minor => version.bump_release(Some(VersionBump::Minor)),
            BumpKind::Patch => version.bump_release(Some(VersionBump::Patch)),
        }
    }
}

impl FromStr for BumpKind {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "release" => Ok(BumpKind::Release),
            "candidate" => Ok(BumpKind::Candidate),
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            other => Err(ReleaseError::config(format!(
                "Invalid part to bump: '{}' (expected major, minor, patch, release or candidate)",
                other
            ))),
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpKind::Release => "release",
            BumpKind::Candidate => "candidate",
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert!(v.is_release());
    }

    #[test]
    fn test_version_parse_candidate() {
        let v = Version::parse("0.9.14rc2").unwrap();
        assert_eq!(v, Version::candidate(0, 9, 14, 2));
        assert!(v.is_candidate());
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("a.2.3").is_err());
        assert!(Version::parse("1.b.3").is_err());
        assert!(Version::parse("1.2.3rcx").is_err());
        assert!(Version::parse("1.2.3beta1").is_err());
        assert!(Version::parse("1.2.3rc0").is_err());
    }

    #[test]
    fn test_version_display_and_tag() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(Version::candidate(1, 2, 3, 4).to_string(), "1.2.3rc4");
        assert_eq!(Version::candidate(1, 2, 3, 4).tag(), "v1.2.3rc4");
    }

    #[test]
    fn test_bump_candidate_from_release_starts_next_patch() {
        let mut v = Version::new(1, 2, 3);
        v.bump_candidate(None).unwrap();
        assert_eq!(v, Version::candidate(1, 2, 4, 1));
    }

    #[test]
    fn test_bump_candidate_from_candidate_increments_counter() {
        let mut v = Version::candidate(1, 2, 4, 1);
        v.bump_candidate(None).unwrap();
        assert_eq!(v, Version::candidate(1, 2, 4, 2));
    }

    #[test]
    fn test_bump_candidate_with_component_resets_counter() {
        let mut v = Version::candidate(1, 2, 4, 3);
        v.bump_candidate(Some(VersionBump::Minor)).unwrap();
        assert_eq!(v, Version::candidate(1, 3, 0, 1));

        let mut v = Version::new(1, 2, 3);
        v.bump_candidate(Some(VersionBump::Major)).unwrap();
        assert_eq!(v, Version::candidate(2, 0, 0, 1));
    }

    #[test]
    fn test_bump_release_promotes_candidate() {
        let mut v = Version::candidate(1, 2, 3, 2);
        v.bump_release(None).unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
    }

    #[test]
    fn test_bump_release_from_release_bumps_patch() {
        let mut v = Version::new(1, 2, 3);
        v.bump_release(None).unwrap();
        assert_eq!(v, Version::new(1, 2, 4));
    }

    #[test]
    fn test_bump_release_with_components() {
        let mut v = Version::new(1, 2, 3);
        v.bump_release(Some(VersionBump::Minor)).unwrap();
        assert_eq!(v, Version::new(1, 3, 0));

        let mut v = Version::candidate(1, 2, 3, 5);
        v.bump_release(Some(VersionBump::Patch)).unwrap();
        assert_eq!(v, Version::new(1, 2, 4));
    }

    #[test]
    fn test_bump_overflow_is_an_error() {
        let mut v = Version::parse("4294967295.0.0").unwrap();
        let err = v.bump_release(Some(VersionBump::Major)).unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidVersion(_)));
        assert_eq!(v, Version::new(u32::MAX, 0, 0));

        let mut v = Version::candidate(1, 2, 3, u32::MAX);
        assert!(v.bump_candidate(None).is_err());
        assert!(BumpKind::Patch.apply(&mut Version::new(0, 0, u32::MAX)).is_err());
    }

    #[test]
    fn test_bump_kind_parse() {
        assert_eq!("release".parse::<BumpKind>().unwrap(), BumpKind::Release);
        assert_eq!("Candidate".parse::<BumpKind>().unwrap(), BumpKind::Candidate);
        assert_eq!("major".parse::<BumpKind>().unwrap(), BumpKind::Major);
        assert!("feature".parse::<BumpKind>().is_err());
    }

    #[test]
    fn test_bump_kind_apply() {
        let mut v = Version::candidate(1, 2, 3, 2);
        BumpKind::Release.apply(&mut v).unwrap();
        assert_eq!(v, Version::new(1, 2, 3));

        let mut v = Version::new(1, 2, 3);
        BumpKind::Minor.apply(&mut v).unwrap();
        assert_eq!(v, Version::new(1, 3, 0));
        assert!(!BumpKind::Candidate.is_release());
    }

    proptest! {
        #[test]
        fn release_strings_round_trip(major in 0u32..1000, minor in 0u32..1000, patch in 0u32..1000) {
            let text = format!("{}.{}.{}", major, minor, patch);
            prop_assert_eq!(Version::parse(&text).unwrap().to_string(), text);
        }

        #[test]
        fn candidate_strings_round_trip(
            major in 0u32..1000,
            minor in 0u32..1000,
            patch in 0u32..1000,
            rc in 1u32..100,
        ) {
            let text = format!("{}.{}.{}rc{}", major, minor, patch, rc);
            prop_assert_eq!(Version::parse(&text).unwrap().to_string(), text);
        }

        #[test]
        fn candidate_bump_of_release_is_next_patch_rc1(major in 0u32..1000, minor in 0u32..1000, patch in 0u32..1000) {
            let mut v = Version::new(major, minor, patch);
            v.bump_candidate(None).unwrap();
            prop_assert_eq!(v, Version::candidate(major, minor, patch + 1, 1));
        }

        #[test]
        fn release_bump_of_candidate_keeps_numbers(
            major in 0u32..1000,
            minor in 0u32..1000,
            patch in 0u32..1000,
            rc in 1u32..100,
        ) {
            let mut v = Version::candidate(major, minor, patch, rc);
            v.bump_release(None).unwrap();
            prop_assert_eq!(v, Version::new(major, minor, patch));
        }

        #[test]
        fn major_release_bump_zeroes_lower_components(
            major in 0u32..1000,
            minor in 0u32..1000,
            patch in 0u32..1000,
            rc in proptest::option::of(1u32..100),
        ) {
            let mut v = Version { major, minor, patch, candidate: rc };
            v.bump_release(Some(VersionBump::Major)).unwrap();
            prop_assert_eq!(v, Version::new(major + 1, 0, 0));
        }
    }
}
