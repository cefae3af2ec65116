//! Error types for matrix expansion, capability detection and resolution.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Kind of identifier handed to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// A processor architecture name or alias.
    Architecture,
    /// A compiler name or alias.
    Compiler,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Architecture => write!(f, "architecture"),
            Self::Compiler => write!(f, "compiler"),
        }
    }
}

/// Every failure `fatarch` reports. Each condition is a distinct variant so
/// callers can tell them apart; none is retried internally.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A name did not resolve through the alias table.
    #[error("unknown {kind} '{input}'")]
    UnknownIdentifier {
        /// What was being resolved.
        kind: IdentifierKind,
        /// The offending input, verbatim.
        input: String,
    },

    /// Live processor identification cannot run here.
    #[error("processor identification unavailable: {reason}")]
    CapabilityUnavailable {
        /// Why detection could not run.
        reason: &'static str,
    },

    /// Two different flag sequences produced the same variant name.
    #[error("variant name '{name}' is produced by both {existing:?} and {conflicting:?}")]
    MatrixNameCollision {
        /// The colliding variant name.
        name: String,
        /// Flags already bound to the name.
        existing: Vec<String>,
        /// Flags that tried to claim the name.
        conflicting: Vec<String>,
    },

    /// A current-machine build was planned from a synthesized snapshot.
    #[error("current-machine builds need the live processor, not the static {architecture} snapshot")]
    StaticProcessor {
        /// Architecture of the static snapshot.
        architecture: String,
    },

    /// Narrowing to the current machine left nothing to build.
    #[error("no candidate of group '{group}' is usable on the current machine")]
    IncompatibleCurrentMachine {
        /// Label of the group that ran empty.
        group: String,
    },

    /// Narrowing to the current compiler left nothing to build.
    #[error("no candidate of group '{group}' is supported by the current compiler")]
    IncompatibleCurrentCompiler {
        /// Label of the group that ran empty.
        group: String,
    },

    /// An option group failed construction-time validation.
    #[error("invalid option group '{group}': {reason}")]
    InvalidMatrix {
        /// Label of the offending group.
        group: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The build configuration is not valid TOML for [`BuildConfig`](crate::BuildConfig).
    #[error("invalid build configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration or source file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// `Result` alias with [`Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
