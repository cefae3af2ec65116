//! Per-compiler flag catalogs and argument-matrix rules.
//!
//! A [`ToolchainProfile`] maps abstract capabilities (floating-point modes,
//! parallel APIs) to concrete flag tokens for one compiler, optionally at a
//! declared version, and knows how to build the [`ArgumentMatrix`] and the native
//! build flags for a processor snapshot.
//!
//! Profiles are built by one constructor per compiler, selected through
//! [`CompilerId::constructor`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::capability::CapabilitySnapshot;
use crate::error::{Error, IdentifierKind, Result};
use crate::matrix::{self, ArgumentMatrix};

pub mod gcc;
pub mod msvc;

/// Declared compiler version, `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns true if `self` is at least `major.minor`.
    #[must_use]
    pub fn at_least(self, major: u32, minor: u32) -> bool {
        self >= Self::new(major, minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A version string was not `major[.minor[...]]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid compiler version '{0}'")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    /// Parses `"12"`, `"4.9"` or `"14.1.2"`; components past the minor are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_owned());
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| err())?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

/// Whether a capability is a code-generation option or an auxiliary API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Code-generation option (e.g. `fast_fpmath`).
    Option,
    /// Auxiliary parallel API (e.g. `openmp`).
    Api,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Option => write!(f, "option"),
            Self::Api => write!(f, "api"),
        }
    }
}

/// Compile and link tokens for one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    /// Option or API.
    pub kind: CapabilityKind,
    /// Tokens added to every compile command.
    pub compile: &'static [&'static str],
    /// Tokens added to the link command.
    pub link: &'static [&'static str],
}

/// Compilers with a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerId {
    /// GNU Compiler Collection and compatible drivers.
    Gcc,
    /// Microsoft Visual C++.
    Msvc,
}

impl CompilerId {
    /// Every compiler with a profile.
    pub const ALL: [CompilerId; 2] = [CompilerId::Gcc, CompilerId::Msvc];

    /// Returns the profile constructor of this compiler.
    #[must_use]
    pub fn constructor(self) -> fn(Option<Version>) -> ToolchainProfile {
        match self {
            Self::Gcc => gcc::profile,
            Self::Msvc => msvc::profile,
        }
    }

    /// Canonical catalog name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Msvc => "msvc",
        }
    }

    /// Maps a canonical catalog name to an id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIdentifier`] for names without a profile.
    pub fn from_canonical(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == name)
            .ok_or_else(|| Error::UnknownIdentifier {
                kind: IdentifierKind::Compiler,
                input: name.to_owned(),
            })
    }
}

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type MatrixRule = fn(&ToolchainProfile, &CapabilitySnapshot) -> Result<ArgumentMatrix>;
type NativeRule = fn(&ToolchainProfile, &CapabilitySnapshot) -> Result<Vec<String>>;

/// Immutable flag catalog and rules for one compiler.
///
/// Without a declared version no candidate is version-gated: every flag the
/// profile knows is assumed to be accepted.
#[derive(Debug, Clone)]
pub struct ToolchainProfile {
    id: CompilerId,
    version: Option<Version>,
    capabilities: BTreeMap<&'static str, FlagSet>,
    matrix_rule: MatrixRule,
    native_rule: NativeRule,
}

impl ToolchainProfile {
    /// Builds the profile of `id`, at `version` if known.
    #[must_use]
    pub fn new(id: CompilerId, version: Option<Version>) -> Self {
        (id.constructor())(version)
    }

    pub(crate) fn from_parts(
        id: CompilerId,
        version: Option<Version>,
        capabilities: &[(&'static str, FlagSet)],
        matrix_rule: MatrixRule,
        native_rule: NativeRule,
    ) -> Self {
        Self {
            id,
            version,
            capabilities: capabilities.iter().copied().collect(),
            matrix_rule,
            native_rule,
        }
    }

    /// Compiler id.
    #[must_use]
    pub fn id(&self) -> CompilerId {
        self.id
    }

    /// Declared version, if any.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Returns true unless a declared version is older than `major.minor`.
    #[must_use]
    pub fn accepts_since(&self, major: u32, minor: u32) -> bool {
        self.version.is_none_or(|v| v.at_least(major, minor))
    }

    /// Every capability, by name.
    #[must_use]
    pub fn capabilities(&self) -> &BTreeMap<&'static str, FlagSet> {
        &self.capabilities
    }

    /// Looks up a capability of either kind.
    #[must_use]
    pub fn supported(&self, name: &str) -> Option<&FlagSet> {
        self.capabilities.get(name)
    }

    /// Returns true if `name` is a supported API.
    #[must_use]
    pub fn supports_api(&self, name: &str) -> bool {
        self.lookup(CapabilityKind::Api, name).is_some()
    }

    /// Returns true if `name` is a supported option.
    #[must_use]
    pub fn supports_option(&self, name: &str) -> bool {
        self.lookup(CapabilityKind::Option, name).is_some()
    }

    /// Looks up a capability of a given kind.
    #[must_use]
    pub fn lookup(&self, kind: CapabilityKind, name: &str) -> Option<&FlagSet> {
        self.supported(name).filter(|flags| flags.kind == kind)
    }

    /// Builds the argument matrix for `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatrix`] if the rule produces an invalid group.
    pub fn argument_matrix(&self, snapshot: &CapabilitySnapshot) -> Result<ArgumentMatrix> {
        (self.matrix_rule)(self, snapshot)
    }

    /// Flags for a build tuned to exactly the processor of `snapshot`.
    ///
    /// # Errors
    ///
    /// Propagates matrix errors for compilers whose native rule is the best
    /// matrix variant.
    pub fn native_args(&self, snapshot: &CapabilitySnapshot) -> Result<Vec<String>> {
        (self.native_rule)(self, snapshot)
    }
}

/// Native rule shared by compilers without a "tune for this machine" flag.
pub(crate) fn best_variant_flags(
    profile: &ToolchainProfile,
    snapshot: &CapabilitySnapshot,
) -> Result<Vec<String>> {
    Ok(matrix::best_variant(&profile.argument_matrix(snapshot)?)?.flags)
}

pub(crate) fn tokens(flags: &[&str]) -> Vec<String> {
    flags.iter().map(|f| (*f).to_owned()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn version_parsing() {
        assert_eq!("4.9".parse::<Version>().unwrap(), Version::new(4, 9));
        assert_eq!("12".parse::<Version>().unwrap(), Version::new(12, 0));
        assert_eq!(" 14.1.2 ".parse::<Version>().unwrap(), Version::new(14, 1));
        assert!("".parse::<Version>().is_err());
        assert!("4.x".parse::<Version>().is_err());
    }

    #[test]
    fn version_ordering() {
        assert!(Version::new(4, 10).at_least(4, 9));
        assert!(Version::new(5, 0).at_least(4, 9));
        assert!(!Version::new(4, 8).at_least(4, 9));
        assert_eq!(Version::new(14, 1).to_string(), "14.1");
    }

    #[test]
    fn profiles_resolve_by_id() {
        for id in CompilerId::ALL {
            let profile = ToolchainProfile::new(id, None);
            assert_eq!(profile.id(), id);
            assert_eq!(CompilerId::from_canonical(id.as_str()).unwrap(), id);
        }
        assert!(CompilerId::from_canonical("clang").is_err());
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let gcc = ToolchainProfile::new(CompilerId::Gcc, None);
        assert!(gcc.supports_api("openmp"));
        assert!(!gcc.supports_option("openmp"));
        assert!(gcc.supports_option("fast_fpmath"));
        assert!(!gcc.supports_api("fast_fpmath"));
        assert!(gcc.supported("nonexistent").is_none());
    }

    #[test]
    fn unknown_version_gates_nothing() {
        let unknown = ToolchainProfile::new(CompilerId::Gcc, None);
        assert_eq!(unknown.version(), None);
        assert!(unknown.accepts_since(99, 0));
        let old = ToolchainProfile::new(CompilerId::Gcc, Some(Version::new(4, 6)));
        assert!(old.accepts_since(4, 6));
        assert!(!old.accepts_since(4, 7));
    }

    #[test]
    fn capability_registry_lists_every_entry() {
        let msvc = ToolchainProfile::new(CompilerId::Msvc, None);
        let names: Vec<_> = msvc.capabilities().keys().copied().collect();
        assert_eq!(names, vec!["fast_fpmath", "openmp"]);
        assert!(msvc
            .capabilities()
            .iter()
            .all(|(name, flags)| msvc.lookup(flags.kind, name) == Some(flags)));
    }
}
