//! Name canonicalization and snapshot/profile instantiation.
//!
//! Names are compared after [`normalize_identifier`]: `"X86-64"`, `"x86_64"`
//! and `"x8664"` all resolve to `x86_64`.

use std::collections::HashMap;
use std::sync::OnceLock;

use fatarch_catalog::{normalize_identifier, Catalog};
use log::debug;

use crate::capability::{self, CapabilitySnapshot};
use crate::error::{Error, IdentifierKind, Result};
use crate::toolchain::{CompilerId, ToolchainProfile, Version};

/// A name to resolve, or the running platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// The machine or compiler this process runs on / was built with.
    Current,
    /// A free-form name or alias.
    Named(&'a str),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(name: &'a str) -> Self {
        Self::Named(name)
    }
}

impl<'a> From<Option<&'a str>> for Target<'a> {
    fn from(name: Option<&'a str>) -> Self {
        name.map_or(Self::Current, Self::Named)
    }
}

type AliasMap = HashMap<String, &'static str>;

fn architecture_aliases() -> &'static AliasMap {
    static ALIASES: OnceLock<AliasMap> = OnceLock::new();
    ALIASES.get_or_init(|| Catalog::full().architecture_aliases().into_iter().collect())
}

fn compiler_aliases() -> &'static AliasMap {
    static ALIASES: OnceLock<AliasMap> = OnceLock::new();
    ALIASES.get_or_init(|| Catalog::full().compiler_aliases().into_iter().collect())
}

fn lookup(map: &AliasMap, kind: IdentifierKind, name: &str) -> Result<&'static str> {
    map.get(&normalize_identifier(name))
        .copied()
        .ok_or_else(|| Error::UnknownIdentifier {
            kind,
            input: name.to_owned(),
        })
}

/// Resolves an architecture name or alias to its canonical name.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] if no alias matches.
pub fn resolve_architecture(name: &str) -> Result<&'static str> {
    lookup(architecture_aliases(), IdentifierKind::Architecture, name)
}

/// Resolves a compiler name or alias to its canonical name.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] if no alias matches.
pub fn resolve_compiler(name: &str) -> Result<&'static str> {
    lookup(compiler_aliases(), IdentifierKind::Compiler, name)
}

/// Resolves a platform tag such as `linux-x86_64`, `win-amd64` or
/// `macosx-10.9-x86_64`.
///
/// The whole tag is tried first, then its `-` separated parts from the last.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] carrying the whole tag if no part
/// matches.
pub fn architecture_from_platform(platform: &str) -> Result<&'static str> {
    let aliases = architecture_aliases();
    std::iter::once(platform)
        .chain(platform.rsplit('-'))
        .find_map(|part| aliases.get(&normalize_identifier(part)).copied())
        .ok_or_else(|| Error::UnknownIdentifier {
            kind: IdentifierKind::Architecture,
            input: platform.to_owned(),
        })
}

/// Canonical architecture of `target`.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] for unknown names, including a
/// running platform missing from the catalog.
pub fn architecture(target: Target<'_>) -> Result<&'static str> {
    match target {
        Target::Current => resolve_architecture(std::env::consts::ARCH),
        Target::Named(name) => resolve_architecture(name),
    }
}

/// Canonical compiler of `target`: `msvc` on MSVC targets, `gcc` otherwise.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] for unknown names.
pub fn compiler(target: Target<'_>) -> Result<&'static str> {
    match target {
        Target::Current if cfg!(target_env = "msvc") => resolve_compiler("msvc"),
        Target::Current => resolve_compiler("gcc"),
        Target::Named(name) => resolve_compiler(name),
    }
}

/// Snapshot for `target`: live for [`Target::Current`], static otherwise.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] for unknown names and
/// [`Error::CapabilityUnavailable`] when live detection cannot run.
pub fn processor(target: Target<'_>) -> Result<CapabilitySnapshot> {
    match target {
        Target::Current => capability::detect_current().cloned(),
        Target::Named(name) => {
            let canonical = resolve_architecture(name)?;
            debug!("resolved architecture '{name}' to {canonical}");
            capability::for_architecture(canonical)
        }
    }
}

/// Profile for `target`, at `version` if known.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] for unknown names.
pub fn toolchain(target: Target<'_>, version: Option<Version>) -> Result<ToolchainProfile> {
    let canonical = compiler(target)?;
    match version {
        Some(version) => debug!("using compiler {canonical} {version}"),
        None => debug!("using compiler {canonical}, version unknown"),
    }
    Ok(ToolchainProfile::new(CompilerId::from_canonical(canonical)?, version))
}
