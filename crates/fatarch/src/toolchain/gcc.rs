//! GNU Compiler Collection.
//!
//! Instruction-set tiers list every implied `-m` flag explicitly so a variant
//! never depends on GCC's own implication rules.

use crate::capability::CapabilitySnapshot;
use crate::error::Result;
use crate::matrix::{ArgumentMatrix, CandidateOption, OptionGroup};

use super::{tokens, CapabilityKind, CompilerId, FlagSet, ToolchainProfile, Version};

const CAPABILITIES: &[(&str, FlagSet)] = &[
    (
        "fast_fpmath",
        FlagSet {
            kind: CapabilityKind::Option,
            compile: &["-Ofast"],
            link: &[],
        },
    ),
    (
        "openmp",
        FlagSet {
            kind: CapabilityKind::Api,
            compile: &["-fopenmp"],
            link: &["-fopenmp"],
        },
    ),
    (
        "openacc",
        FlagSet {
            kind: CapabilityKind::Api,
            compile: &["-fopenacc"],
            link: &[],
        },
    ),
    (
        "cilkplus",
        FlagSet {
            kind: CapabilityKind::Api,
            compile: &["-fcilkplus", "-lcilkrts"],
            link: &["-fcilkplus", "-lcilkrts"],
        },
    ),
];

const INTEL: &str = "GenuineIntel";
const AMD: &str = "AuthenticAMD";

const AVX2_CHAIN: &[&str] = &["-mavx2", "-mavx", "-msse4.2", "-msse4.1", "-mssse3", "-msse2", "-msse"];
const AVX_CHAIN: &[&str] = &["-mavx", "-msse4.2", "-msse4.1", "-mssse3", "-msse2", "-msse"];

/// Builds the GCC profile.
#[must_use]
pub fn profile(version: Option<Version>) -> ToolchainProfile {
    ToolchainProfile::from_parts(CompilerId::Gcc, version, CAPABILITIES, matrix, native)
}

fn matrix(profile: &ToolchainProfile, cpu: &CapabilitySnapshot) -> Result<ArgumentMatrix> {
    let mut groups = vec![OptionGroup::fixed("optimization", ["-flto", "-O3"])];

    match cpu.architecture() {
        "x86_64" => {
            groups.push(OptionGroup::fixed("word size", ["-m64"]));
            groups.push(OptionGroup::tiered(
                "instruction set",
                vec![
                    CandidateOption::new(["-mavx512cd", "-mavx512f"])
                        .suffix("avx512")
                        .import_if(cpu.all_usable(&["avx512f", "avx512cd"]))
                        .build_if(profile.accepts_since(4, 9)),
                    CandidateOption::new(AVX2_CHAIN.iter().copied())
                        .suffix("avx2")
                        .import_if(cpu.is_usable("avx2"))
                        .build_if(profile.accepts_since(4, 7)),
                    CandidateOption::new(AVX_CHAIN.iter().copied())
                        .suffix("avx")
                        .import_if(cpu.is_usable("avx"))
                        .build_if(profile.accepts_since(4, 6)),
                    CandidateOption::generic(),
                ],
            ));
            groups.push(vendor_tuning(profile, cpu));
        }
        "x86_32" => {
            groups.push(OptionGroup::fixed("word size", ["-m32"]));
            groups.push(OptionGroup::tiered("instruction set", x86_32_tiers(profile, cpu)));
            groups.push(vendor_tuning(profile, cpu));
        }
        _ => {}
    }

    ArgumentMatrix::new(groups)
}

fn x86_32_tiers(profile: &ToolchainProfile, cpu: &CapabilitySnapshot) -> Vec<CandidateOption> {
    let sse = |suffix: &str, flags: &[&str], eligible: bool| {
        CandidateOption::new(std::iter::once("-mfpmath=sse").chain(flags.iter().copied()))
            .suffix(suffix)
            .import_if(eligible)
    };
    vec![
        sse("avx2", AVX2_CHAIN, cpu.is_usable("avx2")).build_if(profile.accepts_since(4, 7)),
        sse("avx", AVX_CHAIN, cpu.is_usable("avx")).build_if(profile.accepts_since(4, 6)),
        sse(
            "sse4_2",
            &["-msse4.2", "-msse4.1", "-mssse3", "-msse2", "-msse"],
            cpu.is_usable("sse4.2"),
        ),
        sse(
            "sse4_1",
            &["-msse4.1", "-mssse3", "-msse2", "-msse"],
            cpu.is_usable("sse4.1"),
        ),
        sse(
            "sse4a",
            &["-msse4a", "-mssse3", "-msse2", "-msse"],
            cpu.is_usable("sse4a") && cpu.may_be_vendor(AMD),
        ),
        sse("ssse3", &["-mssse3", "-msse2", "-msse"], cpu.is_usable("ssse3")),
        sse("sse2", &["-msse2", "-msse"], cpu.is_usable("sse2")),
        sse("sse", &["-msse"], cpu.is_usable("sse")),
        CandidateOption::new(["-mfpmath=387"]),
    ]
}

fn vendor_tuning(profile: &ToolchainProfile, cpu: &CapabilitySnapshot) -> OptionGroup {
    OptionGroup::tiered(
        "vendor tuning",
        vec![
            CandidateOption::new(["-mtune=intel"])
                .suffix("intel")
                .import_if(cpu.may_be_vendor(INTEL))
                .build_if(profile.accepts_since(4, 9)),
            CandidateOption::generic(),
        ],
    )
}

fn native(_profile: &ToolchainProfile, cpu: &CapabilitySnapshot) -> Result<Vec<String>> {
    let mut args = tokens(&["-march=native", "-flto"]);
    match cpu.architecture() {
        "x86_32" => {
            args.push("-m32".to_owned());
            if cpu.has("sse") {
                args.push("-mfpmath=sse".to_owned());
            }
        }
        "x86_64" => args.push("-m64".to_owned()),
        _ => {}
    }
    Ok(args)
}
