//! Processor capability snapshots.
//!
//! A [`CapabilitySnapshot`] is one processor's identity: vendor, brand and the
//! set of feature names it reports. Snapshots come from two places:
//!
//! - [`detect_current`] decodes the running processor once per process
//!   (x86 and x86_64 only).
//! - [`for_architecture`] synthesizes a snapshot exposing every feature an
//!   architecture can have, for offline builds of all variants.
//!
//! Features that need OS-managed wide registers (AVX family, FMA, AVX-512)
//! are reported by [`has`](CapabilitySnapshot::has) but only counted as
//! [`usable`](CapabilitySnapshot::is_usable) when the OS has enabled that
//! register state. AVX-512 features additionally need the opmask and upper
//! ZMM state.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use fatarch_catalog::{Architecture, Catalog};
use log::debug;
use serde::Serialize;

use crate::error::{Error, IdentifierKind, Result};

pub mod decode;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod x86;

pub use decode::{decode, CpuidRegisters, CpuidSource};

const AVX512_PREFIX: &str = "avx512";

/// Where a snapshot's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Decoded from the running processor.
    Live,
    /// Synthesized from catalog data.
    Static,
}

/// Immutable capability description of one processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilitySnapshot {
    architecture: &'static str,
    vendor: String,
    brand: String,
    features: BTreeSet<String>,
    highest_basic_level: u32,
    highest_extended_level: u32,
    os_supports_extended_simd: bool,
    os_supports_avx512_state: bool,
    #[serde(skip)]
    wide_register_features: &'static [&'static str],
    origin: Origin,
}

impl CapabilitySnapshot {
    /// Canonical architecture name.
    #[must_use]
    pub fn architecture(&self) -> &'static str {
        self.architecture
    }

    /// Manufacturer ID (e.g. `GenuineIntel`), empty when unknown.
    #[must_use]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Model name, possibly empty.
    #[must_use]
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Every reported feature, ignoring OS support.
    #[must_use]
    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    /// Highest basic identification leaf.
    #[must_use]
    pub fn highest_basic_level(&self) -> u32 {
        self.highest_basic_level
    }

    /// Highest extended identification leaf.
    #[must_use]
    pub fn highest_extended_level(&self) -> u32 {
        self.highest_extended_level
    }

    /// Whether the OS has enabled the YMM register state (AVX, AVX2, FMA).
    #[must_use]
    pub fn os_supports_extended_simd(&self) -> bool {
        self.os_supports_extended_simd
    }

    /// Whether the OS has also enabled the opmask and ZMM state of AVX-512.
    #[must_use]
    pub fn os_supports_avx512_state(&self) -> bool {
        self.os_supports_avx512_state
    }

    /// Where the data came from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Returns true if the processor reports `feature`.
    #[must_use]
    pub fn has(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Returns true if `feature` is reported and can actually be used.
    #[must_use]
    pub fn is_usable(&self, feature: &str) -> bool {
        if !self.has(feature) {
            return false;
        }
        if !self.needs_wide_registers(feature) {
            return true;
        }
        self.os_supports_extended_simd
            && (self.os_supports_avx512_state || !feature.starts_with(AVX512_PREFIX))
    }

    /// Returns true if every feature in `features` is usable.
    #[must_use]
    pub fn all_usable(&self, features: &[&str]) -> bool {
        features.iter().all(|f| self.is_usable(f))
    }

    /// Reported features minus those the OS cannot run.
    #[must_use]
    pub fn usable_features(&self) -> BTreeSet<&str> {
        self.features
            .iter()
            .map(String::as_str)
            .filter(|f| self.is_usable(f))
            .collect()
    }

    /// Returns true if the vendor is unknown or equal to `vendor`.
    #[must_use]
    pub fn may_be_vendor(&self, vendor: &str) -> bool {
        self.vendor.is_empty() || self.vendor == vendor
    }

    fn needs_wide_registers(&self, feature: &str) -> bool {
        self.wide_register_features.contains(&feature)
    }
}

/// Synthesizes the snapshot of an architecture with every feature present.
///
/// `name` must be canonical; use [`resolver`](crate::resolver) for aliases.
///
/// # Errors
///
/// Returns [`Error::UnknownIdentifier`] if `name` is not a catalog architecture.
pub fn for_architecture(name: &str) -> Result<CapabilitySnapshot> {
    let arch = Catalog::full()
        .find_architecture(name)
        .ok_or_else(|| Error::UnknownIdentifier {
            kind: IdentifierKind::Architecture,
            input: name.to_owned(),
        })?;
    Ok(static_snapshot(arch))
}

fn static_snapshot(arch: &Architecture) -> CapabilitySnapshot {
    CapabilitySnapshot {
        architecture: arch.name,
        vendor: String::new(),
        brand: String::new(),
        features: arch.all_features().into_iter().map(str::to_owned).collect(),
        highest_basic_level: 0,
        highest_extended_level: 0,
        os_supports_extended_simd: true,
        os_supports_avx512_state: true,
        wide_register_features: arch.wide_register_features,
        origin: Origin::Static,
    }
}

/// Returns the running processor's snapshot, decoding it on first use.
///
/// # Errors
///
/// Returns [`Error::CapabilityUnavailable`] on targets without `cpuid`.
pub fn detect_current() -> Result<&'static CapabilitySnapshot> {
    static CURRENT: OnceLock<Result<CapabilitySnapshot, &'static str>> = OnceLock::new();
    CURRENT
        .get_or_init(detect_uncached)
        .as_ref()
        .map_err(|&reason| Error::CapabilityUnavailable { reason })
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect_uncached() -> Result<CapabilitySnapshot, &'static str> {
    let name = if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else {
        "x86_32"
    };
    let arch = Catalog::full()
        .find_architecture(name)
        .ok_or("running architecture missing from catalog")?;
    let mut snapshot = decode(&mut x86::HardwareCpuid, arch, x86::os_supports_extended_simd());
    snapshot.os_supports_avx512_state &= x86::os_supports_avx512_state();
    debug!(
        "detected {} '{}' with {} usable features",
        snapshot.vendor,
        snapshot.brand,
        snapshot.usable_features().len()
    );
    Ok(snapshot)
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn detect_uncached() -> Result<CapabilitySnapshot, &'static str> {
    debug!("no processor identification instruction on this target");
    Err("processor identification is only implemented for x86 and x86_64")
}
