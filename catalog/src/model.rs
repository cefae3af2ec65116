//! Core catalog model types.
//!
//! These types describe processor architectures and compilers as typed Rust
//! data. All instances are built once and referenced via borrows. The
//! top-level entry point is [`Catalog::full()`](crate::Catalog::full).

use std::collections::BTreeSet;

/// Processor family an architecture belongs to.
///
/// - `X86`: identified at runtime through the `cpuid` instruction
/// - `Arm`: no portable identification instruction; static features only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Intel/AMD x86 and x86-64.
    X86,
    /// 32-bit and 64-bit ARM.
    Arm,
}

impl Family {
    /// Returns the lower-case family name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Family::X86 => "x86",
            Family::Arm => "arm",
        }
    }
}

/// One of the four general purpose registers returned by an identification query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    /// `eax`
    Eax,
    /// `ebx`
    Ebx,
    /// `ecx`
    Ecx,
    /// `edx`
    Edx,
}

impl Register {
    /// Returns the register mnemonic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Register::Eax => "eax",
            Register::Ebx => "ebx",
            Register::Ecx => "ecx",
            Register::Edx => "edx",
        }
    }
}

/// First leaf of the extended (vendor-specific) identification range.
pub const EXTENDED_LEAF_BASE: u32 = 0x8000_0000;

/// Names of the 32 bits of one register for one identification leaf.
///
/// `None` marks a reserved or unknown bit: it is skipped while decoding,
/// never treated as "feature absent".
#[derive(Debug, Clone, Copy)]
pub struct FeatureTable {
    /// Identification leaf (input `eax`).
    pub leaf: u32,
    /// Register holding the feature bits.
    pub register: Register,
    /// Feature name per bit position, bit 0 first.
    pub bits: [Option<&'static str>; 32],
}

impl FeatureTable {
    /// Returns true if this table lives in the extended leaf range.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.leaf >= EXTENDED_LEAF_BASE
    }

    /// Iterates over `(bit, name)` pairs for every defined bit.
    pub fn named_bits(&self) -> impl Iterator<Item = (u32, &'static str)> + '_ {
        (0u32..)
            .zip(self.bits.iter())
            .filter_map(|(bit, name)| name.map(|n| (bit, n)))
    }
}

/// A processor architecture known to the catalog.
#[derive(Debug, Clone)]
pub struct Architecture {
    /// Canonical name (e.g., `"x86_64"`).
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Processor family.
    pub family: Family,
    /// Alternative spellings that resolve to this architecture.
    pub aliases: &'static [&'static str],
    /// Identification bit tables, decoded in order. Empty for families
    /// without runtime identification.
    pub feature_tables: &'static [FeatureTable],
    /// Features the architecture may expose that no bit table describes.
    pub static_features: &'static [&'static str],
    /// Features that need operating system support for the wide register
    /// state before they can be used.
    pub wide_register_features: &'static [&'static str],
}

impl Architecture {
    /// Returns the union of every feature this architecture may expose.
    #[must_use]
    pub fn all_features(&self) -> BTreeSet<&'static str> {
        let mut features = self.decodable_features();
        features.extend(self.static_features.iter().copied());
        features
    }

    /// Returns every feature named by the identification bit tables.
    #[must_use]
    pub fn decodable_features(&self) -> BTreeSet<&'static str> {
        self.feature_tables
            .iter()
            .flat_map(|t| t.named_bits().map(|(_, name)| name))
            .collect()
    }

    /// Returns true if `feature` needs OS wide-register support.
    #[must_use]
    pub fn needs_wide_registers(&self, feature: &str) -> bool {
        self.wide_register_features.contains(&feature)
    }
}

/// A compiler known to the catalog.
#[derive(Debug, Clone)]
pub struct Compiler {
    /// Canonical name (e.g., `"gcc"`).
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Alternative spellings that resolve to this compiler.
    pub aliases: &'static [&'static str],
}

/// The complete catalog.
#[derive(Debug)]
pub struct Catalog {
    /// Catalog data version.
    pub version: &'static str,
    /// All architectures, in declaration order.
    pub architectures: Vec<Architecture>,
    /// All compilers, in declaration order.
    pub compilers: Vec<Compiler>,
}

impl Catalog {
    /// Looks up an architecture by canonical name. Returns `None` if not found.
    #[must_use]
    pub fn find_architecture(&self, name: &str) -> Option<&Architecture> {
        self.architectures.iter().find(|a| a.name == name)
    }

    /// Looks up a compiler by canonical name. Returns `None` if not found.
    #[must_use]
    pub fn find_compiler(&self, name: &str) -> Option<&Compiler> {
        self.compilers.iter().find(|c| c.name == name)
    }

    /// Returns `(normalized alias, canonical name)` pairs for every
    /// architecture. The canonical name is always included as its own alias.
    #[must_use]
    pub fn architecture_aliases(&self) -> Vec<(String, &'static str)> {
        self.architectures
            .iter()
            .flat_map(|a| {
                std::iter::once(a.name)
                    .chain(a.aliases.iter().copied())
                    .map(move |alias| (normalize_identifier(alias), a.name))
            })
            .collect()
    }

    /// Returns `(normalized alias, canonical name)` pairs for every compiler.
    #[must_use]
    pub fn compiler_aliases(&self) -> Vec<(String, &'static str)> {
        self.compilers
            .iter()
            .flat_map(|c| {
                std::iter::once(c.name)
                    .chain(c.aliases.iter().copied())
                    .map(move |alias| (normalize_identifier(alias), c.name))
            })
            .collect()
    }
}

/// Normalizes an identifier for alias lookup: lower-cases it and drops every
/// character that is not ASCII alphanumeric, so `"X86-64"`, `"x86_64"` and
/// `"x8664"` all compare equal.
#[must_use]
pub fn normalize_identifier(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
