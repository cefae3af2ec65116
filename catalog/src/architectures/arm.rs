//! 32-bit and 64-bit ARM.
//!
//! ARM has no unprivileged identification instruction comparable to `cpuid`,
//! so these entries carry static feature lists only. Live detection is not
//! offered for them.

use crate::model::{Architecture, Family};

/// Returns the 32-bit ARM architecture.
#[must_use]
pub fn arm_32() -> Architecture {
    Architecture {
        name: "arm_32",
        label: "ARM (32-bit)",
        family: Family::Arm,
        aliases: &["arm"],
        feature_tables: &[],
        static_features: &["vfp", "vfpv3", "vfpv4", "neon", "thumb2", "idiva"],
        wide_register_features: &[],
    }
}

/// Returns the 64-bit ARM architecture.
#[must_use]
pub fn arm_64() -> Architecture {
    Architecture {
        name: "arm_64",
        label: "AArch64",
        family: Family::Arm,
        aliases: &["arm64", "aarch64"],
        feature_tables: &[],
        static_features: &["fp", "asimd", "aes", "pmull", "sha1", "sha2", "crc32", "atomics"],
        wide_register_features: &[],
    }
}
