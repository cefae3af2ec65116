//! Processor identification decoding.
//!
//! [`decode`] turns raw identification registers into a
//! [`CapabilitySnapshot`]. The registers come from a [`CpuidSource`], so the
//! decoder runs identically against real hardware and synthetic data.

use std::collections::{BTreeSet, HashMap};

use fatarch_catalog::{Architecture, Register, EXTENDED_LEAF_BASE};
use log::debug;

use super::{CapabilitySnapshot, Origin};

/// Register values returned by one identification query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuidRegisters {
    /// `eax`
    pub eax: u32,
    /// `ebx`
    pub ebx: u32,
    /// `ecx`
    pub ecx: u32,
    /// `edx`
    pub edx: u32,
}

impl CpuidRegisters {
    /// Returns the value of one register.
    #[must_use]
    pub fn get(&self, register: Register) -> u32 {
        match register {
            Register::Eax => self.eax,
            Register::Ebx => self.ebx,
            Register::Ecx => self.ecx,
            Register::Edx => self.edx,
        }
    }
}

/// Something that answers processor identification queries.
pub trait CpuidSource {
    /// Runs the query for `leaf` / `subleaf` and returns the four registers.
    fn cpuid(&mut self, leaf: u32, subleaf: u32) -> CpuidRegisters;
}

const BRAND_LEAVES: [u32; 3] = [0x8000_0002, 0x8000_0003, 0x8000_0004];

/// Queries each leaf at most once per decode pass.
struct LeafCache<'a, S: ?Sized> {
    source: &'a mut S,
    leaves: HashMap<u32, CpuidRegisters>,
}

impl<S: CpuidSource + ?Sized> LeafCache<'_, S> {
    fn leaf(&mut self, leaf: u32) -> CpuidRegisters {
        let source = &mut *self.source;
        *self.leaves.entry(leaf).or_insert_with(|| source.cpuid(leaf, 0))
    }
}

/// Decodes a snapshot for `architecture` from `source`.
///
/// `os_supports_extended_simd` is taken as given and also stands for the
/// AVX-512 register state; live detection narrows the latter afterwards.
pub fn decode<S: CpuidSource + ?Sized>(
    source: &mut S,
    architecture: &Architecture,
    os_supports_extended_simd: bool,
) -> CapabilitySnapshot {
    let mut cache = LeafCache {
        source,
        leaves: HashMap::new(),
    };

    let leaf0 = cache.leaf(0);
    let highest_basic_level = leaf0.eax;
    let vendor = ascii_string(&[leaf0.ebx, leaf0.edx, leaf0.ecx]);
    let highest_extended_level = cache.leaf(EXTENDED_LEAF_BASE).eax;

    let brand = if highest_extended_level >= BRAND_LEAVES[2] {
        let words: Vec<u32> = BRAND_LEAVES
            .iter()
            .flat_map(|&leaf| {
                let r = cache.leaf(leaf);
                [r.eax, r.ebx, r.ecx, r.edx]
            })
            .collect();
        ascii_string(&words)
    } else {
        String::new()
    };

    let mut features = BTreeSet::new();
    for table in architecture.feature_tables {
        let highest = if table.is_extended() {
            highest_extended_level
        } else {
            highest_basic_level
        };
        if table.leaf > highest {
            continue;
        }
        let value = cache.leaf(table.leaf).get(table.register);
        features.extend(
            table
                .named_bits()
                .filter(|(bit, _)| value & (1 << bit) != 0)
                .map(|(_, name)| name.to_owned()),
        );
    }

    debug!(
        "decoded {} features for {} (vendor '{vendor}', basic {highest_basic_level:#x}, extended {highest_extended_level:#x})",
        features.len(),
        architecture.name
    );

    CapabilitySnapshot {
        architecture: architecture.name,
        vendor,
        brand,
        features,
        highest_basic_level,
        highest_extended_level,
        os_supports_extended_simd,
        os_supports_avx512_state: os_supports_extended_simd,
        wide_register_features: architecture.wide_register_features,
        origin: Origin::Live,
    }
}

/// Little-endian bytes of `words`, trimmed of NULs and spaces.
fn ascii_string(words: &[u32]) -> String {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    String::from_utf8_lossy(&bytes)
        .trim_matches(|c: char| c == '\0' || c == ' ')
        .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fatarch_catalog::Catalog;

    /// Answers from a fixed leaf map, counting every query.
    #[derive(Default)]
    struct Synthetic {
        leaves: HashMap<u32, CpuidRegisters>,
        queries: Vec<u32>,
    }

    impl Synthetic {
        fn with_levels(basic: u32, extended: u32) -> Self {
            let mut s = Self::default();
            s.set(0, CpuidRegisters { eax: basic, ..pack_vendor(b"GenuineIntel") });
            s.set(EXTENDED_LEAF_BASE, CpuidRegisters { eax: extended, ..Default::default() });
            s
        }

        fn set(&mut self, leaf: u32, regs: CpuidRegisters) {
            self.leaves.insert(leaf, regs);
        }
    }

    impl CpuidSource for Synthetic {
        fn cpuid(&mut self, leaf: u32, _subleaf: u32) -> CpuidRegisters {
            self.queries.push(leaf);
            self.leaves.get(&leaf).copied().unwrap_or_default()
        }
    }

    fn pack_vendor(vendor: &[u8; 12]) -> CpuidRegisters {
        let word = |i: usize| u32::from_le_bytes([vendor[i], vendor[i + 1], vendor[i + 2], vendor[i + 3]]);
        CpuidRegisters {
            eax: 0,
            ebx: word(0),
            edx: word(4),
            ecx: word(8),
        }
    }

    fn x86_64() -> &'static Architecture {
        Catalog::full().find_architecture("x86_64").unwrap()
    }

    fn all_bits_set() -> Synthetic {
        let mut s = Synthetic::with_levels(7, 0x8000_0004);
        let ones = CpuidRegisters { eax: !0, ebx: !0, ecx: !0, edx: !0 };
        for leaf in [1, 7, 0x8000_0001] {
            s.set(leaf, ones);
        }
        s
    }

    #[test]
    fn every_defined_bit_decodes() {
        let arch = x86_64();
        let snapshot = decode(&mut all_bits_set(), arch, true);
        let expected: BTreeSet<String> = arch.decodable_features().into_iter().map(str::to_owned).collect();
        assert_eq!(snapshot.features, expected);
        assert_eq!(snapshot.origin(), Origin::Live);
    }

    #[test]
    fn clear_bits_decode_to_nothing() {
        let snapshot = decode(&mut Synthetic::with_levels(7, 0x8000_0004), x86_64(), true);
        assert!(snapshot.features.is_empty());
        assert_eq!(snapshot.vendor(), "GenuineIntel");
    }

    #[test]
    fn single_bit() {
        let mut source = Synthetic::with_levels(1, 0);
        source.set(1, CpuidRegisters { edx: 1 << 25, ..Default::default() });
        let snapshot = decode(&mut source, x86_64(), true);
        assert_eq!(snapshot.features.iter().collect::<Vec<_>>(), vec!["sse"]);
    }

    #[test]
    fn leaves_above_reported_level_are_skipped() {
        let mut source = all_bits_set();
        source.set(0, CpuidRegisters { eax: 1, ..pack_vendor(b"AuthenticAMD") });
        source.set(EXTENDED_LEAF_BASE, CpuidRegisters { eax: 0x8000_0000, ..Default::default() });
        let snapshot = decode(&mut source, x86_64(), true);
        assert!(snapshot.has("sse2"));
        assert!(!snapshot.has("avx2"));
        assert!(!snapshot.has("ahf64"));
        assert!(snapshot.brand().is_empty());
        assert!(!source.queries.contains(&7));
        assert!(!source.queries.contains(&0x8000_0002));
    }

    #[test]
    fn brand_string_is_trimmed() {
        let mut source = Synthetic::with_levels(1, 0x8000_0004);
        let mut text = [0u8; 48];
        text[..20].copy_from_slice(b"  Test CPU @ 3.00GHz");
        for (leaf, chunk) in BRAND_LEAVES.iter().zip(text.chunks_exact(16)) {
            let word = |j: usize| u32::from_le_bytes([chunk[j], chunk[j + 1], chunk[j + 2], chunk[j + 3]]);
            source.set(*leaf, CpuidRegisters { eax: word(0), ebx: word(4), ecx: word(8), edx: word(12) });
        }
        let snapshot = decode(&mut source, x86_64(), true);
        assert_eq!(snapshot.brand(), "Test CPU @ 3.00GHz");
    }

    #[test]
    fn each_leaf_queried_once() {
        let mut source = all_bits_set();
        decode(&mut source, x86_64(), true);
        let mut sorted = source.queries.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), source.queries.len());
    }

    #[test]
    fn os_flag_gates_wide_register_features() {
        let snapshot = decode(&mut all_bits_set(), x86_64(), false);
        assert!(snapshot.has("avx"));
        assert!(!snapshot.is_usable("avx"));
        assert!(!snapshot.is_usable("avx512f"));
        assert!(snapshot.is_usable("sse4.2"));
        assert!(!snapshot.usable_features().contains("fma3"));
    }
}
