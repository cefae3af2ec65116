//! Live identification through the `cpuid` instruction.

#[cfg(target_arch = "x86")]
use core::arch::x86::__cpuid_count;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::__cpuid_count;

use super::decode::{CpuidRegisters, CpuidSource};

/// [`CpuidSource`] backed by the running processor.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareCpuid;

impl CpuidSource for HardwareCpuid {
    fn cpuid(&mut self, leaf: u32, subleaf: u32) -> CpuidRegisters {
        // SAFETY: `cpuid` is available on every processor Rust targets for
        // x86/x86_64. Unsupported leaves return unspecified data that the
        // decoder discards by comparing against the reported highest level.
        let r = unsafe { __cpuid_count(leaf, subleaf) };
        CpuidRegisters {
            eax: r.eax,
            ebx: r.ebx,
            ecx: r.ecx,
            edx: r.edx,
        }
    }
}

/// Returns true if the OS saves and restores the YMM register state.
///
/// Covers AVX, AVX2 and FMA only; see [`os_supports_avx512_state`].
#[must_use]
pub fn os_supports_extended_simd() -> bool {
    std::is_x86_feature_detected!("avx")
}

/// Returns true if the OS also saves the opmask and ZMM state of AVX-512.
#[must_use]
pub fn os_supports_avx512_state() -> bool {
    std::is_x86_feature_detected!("avx512f")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_zero_reports_a_vendor() {
        let r = HardwareCpuid.cpuid(0, 0);
        assert!(r.ebx != 0 || r.ecx != 0 || r.edx != 0);
    }

    #[test]
    fn avx512_state_implies_ymm_state() {
        assert!(!os_supports_avx512_state() || os_supports_extended_simd());
    }
}
