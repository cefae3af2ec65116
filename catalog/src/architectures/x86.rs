//! x86 and x86-64 `cpuid` feature bit tables.
//!
//! Leaves 1 and 7 are the Intel-defined standard feature leaves. Leaf
//! `0x8000_0001` is the AMD-defined extended feature leaf; several of its
//! `edx` bits repeat leaf 1 `edx` under the same names, and the decoder
//! unions both.
//!
//! Bit layouts follow <http://www.sandpile.org/x86/cpuid.htm>.

use crate::model::{Architecture, Family, FeatureTable, Register};

/// Returns the 32-bit x86 architecture.
#[must_use]
pub fn x86_32() -> Architecture {
    Architecture {
        name: "x86_32",
        label: "x86 (32-bit)",
        family: Family::X86,
        aliases: &["x86_32", "x86", "i386", "i686", "ia32", "win32"],
        feature_tables: TABLES,
        static_features: &[],
        wide_register_features: WIDE_REGISTER_FEATURES,
    }
}

/// Returns the 64-bit x86 architecture.
#[must_use]
pub fn x86_64() -> Architecture {
    Architecture {
        name: "x86_64",
        label: "x86-64",
        family: Family::X86,
        aliases: &["x86_64", "x86-64", "amd64", "em64t", "x64"],
        feature_tables: TABLES,
        static_features: &[],
        wide_register_features: WIDE_REGISTER_FEATURES,
    }
}

/// Every x86 table, in decode order.
pub const TABLES: &[FeatureTable] = &[
    LEAF1_EDX,
    LEAF1_ECX,
    LEAF7_EBX,
    LEAF7_ECX,
    LEAF7_EDX,
    EXT1_EDX,
    EXT1_ECX,
];

/// VEX/EVEX encoded extensions: usable only once the OS saves YMM/ZMM state.
pub const WIDE_REGISTER_FEATURES: &[&str] = &[
    "avx",
    "avx2",
    "fma3",
    "fma4",
    "f16c",
    "xop",
    "avx512f",
    "avx512dq",
    "avx512ifma",
    "avx512pf",
    "avx512er",
    "avx512cd",
    "avx512bw",
    "avx512vl",
    "avx512vbmi",
    "avx512vpopcntdq",
    "avx512qvnniw",
    "avx512qfma",
];

/// Leaf 1 `edx`: Intel standard features.
pub const LEAF1_EDX: FeatureTable = FeatureTable {
    leaf: 1,
    register: Register::Edx,
    bits: [
        Some("fpu"),   // 00 x87 FPU on chip
        Some("vme"),   // 01 virtual-8086 mode enhancement
        Some("de"),    // 02 debugging extensions
        Some("pse"),   // 03 page size extension
        Some("tsc"),   // 04 time stamp counter
        Some("msr"),   // 05 RDMSR/WRMSR
        Some("pae"),   // 06 physical address extension
        Some("mce"),   // 07 machine check exception
        Some("cx8"),   // 08 CMPXCHG8B
        Some("apic"),  // 09 on-chip APIC
        None,          // 10
        Some("sep"),   // 11 SYSENTER/SYSEXIT
        Some("mtrr"),  // 12 memory type range registers
        Some("pge"),   // 13 page global enable
        Some("mca"),   // 14 machine check architecture
        Some("cmov"),  // 15 conditional move
        Some("pat"),   // 16 page attribute table
        Some("pse36"), // 17 36-bit page size extension
        Some("psn"),   // 18 processor serial number
        Some("clfl"),  // 19 CLFLUSH
        None,          // 20
        Some("dtes"),  // 21 debug trace and EMON store
        Some("acpi"),  // 22 thermal monitor and clock control
        Some("mmx"),   // 23 MMX
        Some("fxsr"),  // 24 FXSAVE/FXRSTOR
        Some("sse"),   // 25
        Some("sse2"),  // 26
        Some("ss"),    // 27 self-snoop
        Some("htt"),   // 28 max APIC IDs field valid
        Some("tm1"),   // 29 thermal monitor
        Some("ia64"),  // 30 IA-64 emulating x86
        Some("pbe"),   // 31 pending break enable
    ],
};

/// Leaf 1 `ecx`: Intel standard features.
pub const LEAF1_ECX: FeatureTable = FeatureTable {
    leaf: 1,
    register: Register::Ecx,
    bits: [
        Some("sse3"),    // 00
        Some("pclmul"),  // 01 carry-less multiplication
        Some("dtes64"),  // 02 64-bit debug store
        Some("mon"),     // 03 MONITOR/MWAIT
        Some("dscpl"),   // 04 CPL qualified debug store
        Some("vmx"),     // 05 virtual machine extensions
        Some("smx"),     // 06 safer mode extensions
        Some("est"),     // 07 enhanced SpeedStep
        Some("tm2"),     // 08 thermal monitor 2
        Some("ssse3"),   // 09
        Some("cid"),     // 10 L1 context ID
        Some("sdbg"),    // 11 silicon debug
        Some("fma3"),    // 12
        Some("cx16"),    // 13 CMPXCHG16B
        Some("etprd"),   // 14 xTPR update control
        Some("pdcm"),    // 15 perf/debug capability MSR
        None,            // 16
        Some("pcid"),    // 17 process context identifiers
        Some("dca"),     // 18 direct cache access
        Some("sse4.1"),  // 19
        Some("sse4.2"),  // 20
        Some("x2apic"),  // 21
        Some("movbe"),   // 22
        Some("popcnt"),  // 23
        Some("tscd"),    // 24 TSC deadline
        Some("aes"),     // 25
        Some("xsave"),   // 26
        Some("osxsave"), // 27 XSAVE enabled by OS
        Some("avx"),     // 28
        Some("f16c"),    // 29
        Some("rdrand"),  // 30
        Some("hv"),      // 31 hypervisor present
    ],
};

/// Leaf 7 sub-leaf 0 `ebx`: Intel extended features.
pub const LEAF7_EBX: FeatureTable = FeatureTable {
    leaf: 7,
    register: Register::Ebx,
    bits: [
        Some("fsgsbase"),   // 00
        Some("tsc_adjust"), // 01
        Some("sgx"),        // 02
        Some("bmi1"),       // 03
        Some("hle"),        // 04
        Some("avx2"),       // 05
        Some("fpdp"),       // 06 FPU data pointer updated only on exceptions
        Some("smep"),       // 07
        Some("bmi2"),       // 08
        Some("erms"),       // 09 enhanced REP MOVSB/STOSB
        Some("invpcid"),    // 10
        Some("rtm"),        // 11
        Some("pqm"),        // 12 platform QoS monitoring
        Some("fpcsds"),     // 13 FPU CS/DS deprecated
        Some("mpx"),        // 14
        Some("pqe"),        // 15 platform QoS enforcement
        Some("avx512f"),    // 16
        Some("avx512dq"),   // 17
        Some("rdseed"),     // 18
        Some("adx"),        // 19
        Some("smap"),       // 20
        Some("avx512ifma"), // 21
        Some("pcommit"),    // 22
        Some("clflushopt"), // 23
        Some("clwb"),       // 24
        Some("pt"),         // 25 processor trace
        Some("avx512pf"),   // 26
        Some("avx512er"),   // 27
        Some("avx512cd"),   // 28
        Some("sha"),        // 29
        Some("avx512bw"),   // 30
        Some("avx512vl"),   // 31
    ],
};

/// Leaf 7 sub-leaf 0 `ecx`: Intel extended features.
pub const LEAF7_ECX: FeatureTable = FeatureTable {
    leaf: 7,
    register: Register::Ecx,
    bits: [
        Some("prefetchwt1"),     // 00
        Some("avx512vbmi"),      // 01
        Some("umip"),            // 02
        Some("pku"),             // 03
        Some("ospke"),           // 04 PKU enabled by OS
        None,                    // 05
        None,                    // 06
        Some("cet"),             // 07
        None,                    // 08
        None,                    // 09
        None,                    // 10
        None,                    // 11
        None,                    // 12
        None,                    // 13
        Some("avx512vpopcntdq"), // 14
        None,                    // 15
        Some("va57"),            // 16 five-level paging
        None,                    // 17
        None,                    // 18
        None,                    // 19
        None,                    // 20
        None,                    // 21
        Some("rdpid"),           // 22
        None,                    // 23
        None,                    // 24
        None,                    // 25
        None,                    // 26
        None,                    // 27
        None,                    // 28
        None,                    // 29
        Some("sgx_lc"),          // 30 SGX launch configuration
        None,                    // 31
    ],
};

/// Leaf 7 sub-leaf 0 `edx`: Intel extended features.
pub const LEAF7_EDX: FeatureTable = FeatureTable {
    leaf: 7,
    register: Register::Edx,
    bits: [
        None,                 // 00
        None,                 // 01
        Some("avx512qvnniw"), // 02
        Some("avx512qfma"),   // 03
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    ],
};

/// Leaf `0x8000_0001` `edx`: AMD extended features.
pub const EXT1_EDX: FeatureTable = FeatureTable {
    leaf: 0x8000_0001,
    register: Register::Edx,
    bits: [
        Some("fpu"),     // 00
        Some("vme"),     // 01
        Some("de"),      // 02
        Some("pse"),     // 03
        Some("tsc"),     // 04
        Some("msr"),     // 05
        Some("pae"),     // 06
        Some("mce"),     // 07
        Some("cx8"),     // 08
        Some("apic"),    // 09
        None,            // 10
        Some("sep"),     // 11 SYSCALL/SYSRET
        Some("mtrr"),    // 12
        Some("pge"),     // 13
        Some("mca"),     // 14
        Some("cmov"),    // 15
        Some("pat"),     // 16
        Some("pse36"),   // 17
        None,            // 18
        Some("mp"),      // 19 multiprocessor capable
        Some("nx"),      // 20 no-execute
        None,            // 21
        Some("mmx+"),    // 22 extended MMX
        Some("mmx"),     // 23
        Some("fxsr"),    // 24
        Some("ffxsr"),   // 25 FXSAVE/FXRSTOR optimizations
        Some("pg1g"),    // 26 1 GiB pages
        Some("tscp"),    // 27 RDTSCP
        None,            // 28
        Some("lm"),      // 29 long mode
        Some("3dnow!+"), // 30 extended 3DNow!
        Some("3dnow!"),  // 31
    ],
};

/// Leaf `0x8000_0001` `ecx`: AMD extended features.
pub const EXT1_ECX: FeatureTable = FeatureTable {
    leaf: 0x8000_0001,
    register: Register::Ecx,
    bits: [
        Some("ahf64"),    // 00 LAHF/SAHF in long mode
        Some("cmp"),      // 01 core multi-processing legacy mode
        Some("svm"),      // 02 secure virtual machine
        Some("eas"),      // 03 extended APIC space
        Some("cr8d"),     // 04 CR8 in 32-bit mode
        Some("lzcnt"),    // 05
        Some("sse4a"),    // 06
        Some("msse"),     // 07 misaligned SSE
        Some("3dnow!p"),  // 08 PREFETCH/PREFETCHW
        Some("osvw"),     // 09 OS visible workaround
        Some("ibs"),      // 10 instruction based sampling
        Some("xop"),      // 11
        Some("skinit"),   // 12
        Some("wdt"),      // 13 watchdog timer
        None,             // 14
        Some("lwp"),      // 15 lightweight profiling
        Some("fma4"),     // 16
        Some("tce"),      // 17 translation cache extension
        None,             // 18
        Some("nodeid"),   // 19
        None,             // 20
        Some("tbm"),      // 21 trailing bit manipulation
        Some("topx"),     // 22 topology extensions
        Some("pcx_core"), // 23 core performance counters
        Some("pcx_nb"),   // 24 northbridge performance counters
        None,             // 25
        Some("dbx"),      // 26 data breakpoint extensions
        Some("perftsc"),  // 27
        Some("pcx_l2i"),  // 28 L2I performance counters
        Some("monx"),     // 29 MONITORX/MWAITX
        None,             // 30
        None,             // 31
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf1_sse_family_positions() {
        assert_eq!(LEAF1_EDX.bits[25], Some("sse"));
        assert_eq!(LEAF1_EDX.bits[26], Some("sse2"));
        assert_eq!(LEAF1_ECX.bits[28], Some("avx"));
        assert_eq!(LEAF7_EBX.bits[5], Some("avx2"));
    }

    #[test]
    fn names_unique_within_each_table() {
        for table in TABLES {
            let mut seen = std::collections::HashSet::new();
            for (bit, name) in table.named_bits() {
                assert!(
                    seen.insert(name),
                    "duplicate '{}' at leaf {:#x} {} bit {}",
                    name,
                    table.leaf,
                    table.register.as_str(),
                    bit
                );
            }
        }
    }

    #[test]
    fn legacy_and_extended_leaves_share_names() {
        let legacy: Vec<_> = LEAF1_EDX.named_bits().map(|(_, n)| n).collect();
        let extended: Vec<_> = EXT1_EDX.named_bits().map(|(_, n)| n).collect();
        for name in ["fpu", "cmov", "mmx", "fxsr", "pse36"] {
            assert!(legacy.contains(&name));
            assert!(extended.contains(&name));
        }
    }

    #[test]
    fn wide_register_features_are_decodable() {
        let arch = x86_64();
        let decodable = arch.decodable_features();
        for feature in WIDE_REGISTER_FEATURES {
            assert!(decodable.contains(feature), "{feature} has no bit");
        }
    }
}
