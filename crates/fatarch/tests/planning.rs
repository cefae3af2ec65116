//! End-to-end planning: names in, per-artifact compile flags out.

use std::collections::BTreeSet;
use std::fs;

use fatarch::plan::{compile_plan, link_args, PlanRequest};
use fatarch::resolver::{self, Target};
use fatarch::{BuildConfig, Error, Version};

#[test]
fn plan_from_platform_tag_and_alias() -> Result<(), Error> {
    let arch = resolver::architecture_from_platform("win-amd64")?;
    let cpu = resolver::processor(Target::Named(arch))?;
    let msvc = resolver::toolchain(Target::Named("MSVC"), Some(Version::new(14, 1)))?;
    let config = BuildConfig::from_toml_str("suffixes_excludes = [\"avx512\"]")?;
    let apis = BTreeSet::from(["openmp".to_owned()]);

    let plan = compile_plan(
        &config,
        &PlanRequest {
            profile: &msvc,
            processor: &cpu,
            ext_suffix: ".pyd",
            apis: &apis,
        },
    )?;

    let names: Vec<_> = plan.variants().collect();
    assert_eq!(names, vec!["avx2", "avx", ""]);
    let avx2 = plan.target("avx2").map(|t| (t.artifact_suffix.as_str(), t.compile_args.clone()));
    assert_eq!(
        avx2,
        Some((
            ".avx2.pyd",
            vec!["/O2".to_owned(), "/GL".to_owned(), "/arch:AVX2".to_owned(), "/openmp".to_owned()]
        ))
    );
    assert!(link_args(&msvc, apis.iter().map(String::as_str), config.enabled_options()).is_empty());
    Ok(())
}

#[test]
fn apis_detected_from_sources_reach_every_target() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join(format!("fatarch-planning-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("kernel.cpp"), "void f() {\n#pragma omp parallel for\n}\n")?;

    let config = BuildConfig::default();
    let apis = fatarch::sources::detect_apis(&config, &[&dir]);
    fs::remove_dir_all(&dir)?;
    let apis = apis?;

    let cpu = resolver::processor(Target::Named("i686"))?;
    let gcc = resolver::toolchain(Target::Named("mingw32"), Some(Version::new(4, 5)))?;
    let plan = compile_plan(
        &config,
        &PlanRequest {
            profile: &gcc,
            processor: &cpu,
            ext_suffix: ".so",
            apis: &apis,
        },
    )?;

    assert_eq!(plan.targets.len(), 7);
    assert!(plan.targets.iter().all(|t| t.compile_args.last().map(String::as_str) == Some("-fopenmp")));
    assert_eq!(
        link_args(&gcc, apis.iter().map(String::as_str), config.enabled_options()),
        vec!["-fopenmp".to_owned()]
    );
    Ok(())
}

#[test]
fn gcc_without_version_plans_every_x86_64_variant() -> Result<(), Error> {
    let cpu = resolver::processor(Target::Named("amd64"))?;
    let gcc = resolver::toolchain(Target::Named("gcc"), None)?;
    let plan = compile_plan(
        &BuildConfig::default(),
        &PlanRequest {
            profile: &gcc,
            processor: &cpu,
            ext_suffix: ".so",
            apis: &BTreeSet::new(),
        },
    )?;

    let names: Vec<_> = plan.variants().collect();
    assert_eq!(
        names,
        vec!["avx512-intel", "avx512", "avx2-intel", "avx2", "avx-intel", "avx", "intel", ""]
    );
    Ok(())
}

#[test]
fn unknown_architecture_is_reported() {
    let err = resolver::processor(Target::Named("bogus-arch")).err();
    assert_eq!(err.map(|e| e.to_string()), Some("unknown architecture 'bogus-arch'".to_owned()));
}
