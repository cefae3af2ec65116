//! # fatarch
//!
//! Multi-variant native builds with load-time dispatch.
//!
//! `fatarch` computes the compiler flag sets for building several
//! instruction-set-specific variants of the same native code, names each
//! variant deterministically, and picks the variant that best matches the
//! running processor.
//!
//! ```text
//! name/alias ──► resolver ──► CapabilitySnapshot ─┐
//!                    │                            ├─► ArgumentMatrix ──► VariantMap
//!                    └──────► ToolchainProfile ───┘         │
//!                                                           └──► best_variant
//! ```
//!
//! # Example
//!
//! ```
//! use fatarch::matrix::{expand, ExpandMode};
//! use fatarch::resolver::{self, Target};
//! use fatarch::toolchain::Version;
//!
//! let cpu = resolver::processor(Target::Named("amd64"))?;
//! let gcc = resolver::toolchain(Target::Named("gcc"), Some(Version::new(9, 1)))?;
//! let variants = expand(&gcc.argument_matrix(&cpu)?, ExpandMode::All)?;
//!
//! assert_eq!(variants.first().map(|v| v.name.as_str()), Some("avx512-intel"));
//! assert!(variants.contains(""));
//! # Ok::<(), fatarch::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`matrix`]: option groups, Cartesian expansion, variant naming.
//! - [`capability`]: processor snapshots and `cpuid` decoding.
//! - [`resolver`]: alias resolution and the current-platform sentinel.
//! - [`toolchain`]: GCC and MSVC flag catalogs and matrix rules.
//! - [`config`], [`sources`], [`plan`]: build configuration, pragma scanning
//!   and per-artifact compile plans.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod capability;
pub mod config;
pub mod error;
pub mod matrix;
pub mod plan;
pub mod resolver;
pub mod sources;
pub mod toolchain;

pub use capability::{CapabilitySnapshot, Origin};
pub use config::BuildConfig;
pub use error::{Error, IdentifierKind, Result};
pub use matrix::{
    best_variant, expand, ArgumentMatrix, CandidateOption, ExpandMode, OptionGroup, Variant,
    VariantMap, DEFAULT_VARIANT,
};
pub use plan::{BuildPlan, BuildTarget};
pub use resolver::Target;
pub use toolchain::{CompilerId, ToolchainProfile, Version};
