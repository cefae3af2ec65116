//! Build planning: which artifacts to compile and with which flags.
//!
//! A [`BuildPlan`] lists one [`BuildTarget`] per artifact. Each artifact file
//! carries its variant name before the extension suffix, so an
//! extension `module` built for the `avx2` variant becomes
//! `module.avx2.so` next to the generic `module.so`.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;

use crate::capability::{CapabilitySnapshot, Origin};
use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::matrix::{expand, ExpandMode, Variant, DEFAULT_VARIANT};
use crate::toolchain::{CapabilityKind, FlagSet, ToolchainProfile};

/// One artifact to compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    /// Variant name, [`DEFAULT_VARIANT`] for the generic build.
    pub variant: String,
    /// File suffix of the artifact, from [`artifact_suffix`].
    pub artifact_suffix: String,
    /// Flags passed to every compile command of this artifact.
    pub compile_args: Vec<String>,
}

/// Ordered artifacts of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Artifacts in variant order.
    pub targets: Vec<BuildTarget>,
}

impl BuildPlan {
    /// Looks up the target of a variant.
    #[must_use]
    pub fn target(&self, variant: &str) -> Option<&BuildTarget> {
        self.targets.iter().find(|t| t.variant == variant)
    }

    /// Variant names in build order.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.variant.as_str())
    }
}

/// Inputs of [`compile_plan`] besides the configuration.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    /// Compiler that will run.
    pub profile: &'a ToolchainProfile,
    /// Processor to plan for: static for multi-variant builds, live for
    /// `current_machine` builds.
    pub processor: &'a CapabilitySnapshot,
    /// Extension suffix of the generic artifact, e.g. `.so`.
    pub ext_suffix: &'a str,
    /// Requested APIs (explicit or detected from sources).
    pub apis: &'a BTreeSet<String>,
}

/// Artifact file suffix for `variant`.
#[must_use]
pub fn artifact_suffix(variant: &str, ext_suffix: &str) -> String {
    if variant == DEFAULT_VARIANT {
        ext_suffix.to_owned()
    } else {
        format!(".{variant}{ext_suffix}")
    }
}

/// Plans the compile step.
///
/// # Errors
///
/// Returns [`Error::StaticProcessor`] for a `current_machine` build whose
/// processor is not live, and propagates matrix construction and expansion
/// errors.
pub fn compile_plan(config: &BuildConfig, request: &PlanRequest<'_>) -> Result<BuildPlan> {
    let single = |compile_args| BuildPlan {
        targets: vec![BuildTarget {
            variant: DEFAULT_VARIANT.to_owned(),
            artifact_suffix: request.ext_suffix.to_owned(),
            compile_args,
        }],
    };

    if config.disabled {
        debug!("optimizations disabled, planning one generic build");
        return Ok(single(Vec::new()));
    }

    let extra = capability_args(
        request.profile,
        request.apis.iter().map(String::as_str),
        config.enabled_options(),
        |flags| flags.compile,
    );

    let mut plan = if config.current_machine {
        if request.processor.origin() != Origin::Live {
            return Err(Error::StaticProcessor {
                architecture: request.processor.architecture().to_owned(),
            });
        }
        single(request.profile.native_args(request.processor)?)
    } else {
        let matrix = request.profile.argument_matrix(request.processor)?;
        let mut variants = expand(&matrix, ExpandMode::CurrentCompiler)?;
        variants.retain(|v| config.keeps_variant(v));
        BuildPlan {
            targets: variants
                .into_iter()
                .map(|Variant { name, flags }| BuildTarget {
                    artifact_suffix: artifact_suffix(&name, request.ext_suffix),
                    variant: name,
                    compile_args: flags,
                })
                .collect(),
        }
    };

    for target in &mut plan.targets {
        target.compile_args.extend(extra.iter().cloned());
    }
    debug!(
        "planned {} artifacts for {} {}",
        plan.targets.len(),
        request.profile.id(),
        request.processor.architecture()
    );
    Ok(plan)
}

/// Link flags for the requested APIs, then the requested options.
pub fn link_args<'a>(
    profile: &ToolchainProfile,
    apis: impl IntoIterator<Item = &'a str>,
    options: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    capability_args(profile, apis, options, |flags| flags.link)
}

fn capability_args<'a>(
    profile: &ToolchainProfile,
    apis: impl IntoIterator<Item = &'a str>,
    options: impl IntoIterator<Item = &'a str>,
    tokens: impl Fn(&FlagSet) -> &'static [&'static str],
) -> Vec<String> {
    let requested = apis
        .into_iter()
        .map(|n| (CapabilityKind::Api, n))
        .chain(options.into_iter().map(|n| (CapabilityKind::Option, n)));
    let mut args = Vec::new();
    for (kind, name) in requested {
        match profile.lookup(kind, name) {
            Some(flags) => args.extend(tokens(flags).iter().map(|t| (*t).to_owned())),
            None => warn!("{} does not support {kind} '{name}', skipping", profile.id()),
        }
    }
    args
}
