//! Microsoft Visual C++.

use crate::capability::CapabilitySnapshot;
use crate::error::Result;
use crate::matrix::{ArgumentMatrix, CandidateOption, OptionGroup};

use super::{best_variant_flags, CapabilityKind, CompilerId, FlagSet, ToolchainProfile, Version};

const CAPABILITIES: &[(&str, FlagSet)] = &[
    (
        "fast_fpmath",
        FlagSet {
            kind: CapabilityKind::Option,
            compile: &["/fp:fast"],
            link: &[],
        },
    ),
    (
        "openmp",
        FlagSet {
            kind: CapabilityKind::Api,
            compile: &["/openmp"],
            link: &[],
        },
    ),
];

/// Builds the MSVC profile.
///
/// MSVC has no "tune for this machine" switch, so the native rule is the best
/// matrix variant for the snapshot.
#[must_use]
pub fn profile(version: Option<Version>) -> ToolchainProfile {
    ToolchainProfile::from_parts(
        CompilerId::Msvc,
        version,
        CAPABILITIES,
        matrix,
        best_variant_flags,
    )
}

fn arch(flag: &str, suffix: &str) -> CandidateOption {
    CandidateOption::new([format!("/arch:{flag}")]).suffix(suffix)
}

fn matrix(profile: &ToolchainProfile, cpu: &CapabilitySnapshot) -> Result<ArgumentMatrix> {
    let mut groups = vec![OptionGroup::fixed("optimization", ["/O2", "/GL"])];

    let avx512 = arch("AVX512", "avx512")
        .import_if(cpu.all_usable(&["avx512f", "avx512cd"]))
        .build_if(profile.accepts_since(14, 1));
    let avx2 = arch("AVX2", "avx2")
        .import_if(cpu.is_usable("avx2"))
        .build_if(profile.accepts_since(12, 0));
    let avx = arch("AVX", "avx")
        .import_if(cpu.is_usable("avx"))
        .build_if(profile.accepts_since(10, 0));

    match cpu.architecture() {
        "x86_64" => groups.push(OptionGroup::tiered(
            "instruction set",
            vec![avx512, avx2, avx, CandidateOption::generic()],
        )),
        "x86_32" => groups.push(OptionGroup::tiered(
            "instruction set",
            vec![
                avx2,
                avx,
                arch("SSE2", "sse2").import_if(cpu.is_usable("sse2")),
                arch("SSE", "sse").import_if(cpu.is_usable("sse")),
                CandidateOption::new(["/arch:IA32"]),
            ],
        )),
        _ => {}
    }

    ArgumentMatrix::new(groups)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capability::for_architecture;
    use crate::matrix::{expand, ExpandMode};
    use crate::toolchain::tokens;

    #[test]
    fn x86_64_gates_by_version() {
        let cpu = for_architecture("x86_64").unwrap();
        let msvc = profile(Some(Version::new(12, 0)));
        let matrix = msvc.argument_matrix(&cpu).unwrap();
        let all: Vec<_> = expand(&matrix, ExpandMode::All).unwrap().names().map(str::to_owned).collect();
        assert_eq!(all, vec!["avx512", "avx2", "avx", ""]);
        let current = expand(&matrix, ExpandMode::CurrentCompiler).unwrap();
        assert_eq!(current.names().collect::<Vec<_>>(), vec!["avx2", "avx", ""]);
        assert_eq!(current.get("avx2").unwrap(), tokens(&["/O2", "/GL", "/arch:AVX2"]));
    }

    #[test]
    fn native_is_best_variant() {
        let cpu = for_architecture("x86_32").unwrap();
        let args = profile(Some(Version::new(14, 1))).native_args(&cpu).unwrap();
        assert_eq!(args, tokens(&["/O2", "/GL", "/arch:AVX2"]));
        let args = profile(Some(Version::new(9, 0))).native_args(&cpu).unwrap();
        assert_eq!(args, tokens(&["/O2", "/GL", "/arch:SSE2"]));
        let args = profile(None).native_args(&for_architecture("x86_64").unwrap()).unwrap();
        assert_eq!(args, tokens(&["/O2", "/GL", "/arch:AVX512"]));
    }

    #[test]
    fn api_catalog() {
        let msvc = profile(None);
        assert!(msvc.supports_api("openmp"));
        assert!(!msvc.supports_api("openacc"));
        assert_eq!(msvc.supported("fast_fpmath").unwrap().compile, &["/fp:fast"]);
    }
}
