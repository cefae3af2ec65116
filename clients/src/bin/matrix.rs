//! `fatarch-matrix` prints the compiler variants for an architecture and
//! compiler, or the full build plan.
//!
//! **Usage:**
//! ```text
//! fatarch-matrix [--arch <name>] [--compiler <name>] [--compiler-version <x.y>]
//!                [--mode all|current-machine|current-compiler]
//!                [--config <file.toml>] [--api <name>]... [--option <name>]...
//!                [--sources <path>]... [--ext-suffix <suffix>] [--json] [-v]
//! ```
//!
//! Without `--config`, `--api`, `--option` or `--sources` the variant map is
//! printed; with any of them, the compile plan and link flags.
//!
//! Current-machine output (`--mode current-machine`, or `current_machine` in
//! the configuration) always describes the running processor, so it cannot
//! be combined with `--arch`. Without `--compiler-version` no variant is
//! dropped for being too new for the compiler.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use fatarch::matrix::{expand, ExpandMode};
use fatarch::plan::{compile_plan, link_args, PlanRequest};
use fatarch::resolver::{self, Target};
use fatarch::{BuildConfig, Version};
use log::{debug, info};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    All,
    CurrentMachine,
    CurrentCompiler,
}

impl From<Mode> for ExpandMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => ExpandMode::All,
            Mode::CurrentMachine => ExpandMode::CurrentMachine,
            Mode::CurrentCompiler => ExpandMode::CurrentCompiler,
        }
    }
}

/// Print compiler argument variants.
#[derive(Parser)]
#[command(name = "fatarch-matrix", about = "Print compiler argument variants")]
struct Args {
    /// Architecture name, alias or platform tag. Defaults to the running machine.
    #[arg(long)]
    arch: Option<String>,

    /// Compiler name or alias. Defaults to the one for this platform.
    #[arg(long)]
    compiler: Option<String>,

    /// Declared compiler version; drops instruction sets it predates.
    #[arg(long)]
    compiler_version: Option<Version>,

    /// Which variants to print.
    #[arg(long, value_enum, default_value = "all")]
    mode: Mode,

    /// Build configuration file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// API to enable, e.g. `openmp`.
    #[arg(long = "api")]
    apis: Vec<String>,

    /// Option to enable, e.g. `fast_fpmath`.
    #[arg(long = "option")]
    options: Vec<String>,

    /// Source files or directories scanned for API pragmas.
    #[arg(long)]
    sources: Vec<PathBuf>,

    /// Extension suffix of the generic artifact.
    #[arg(long, default_value = ".so")]
    ext_suffix: String,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    fatarch_clients::init_logging(args.verbose)?;

    let planning = args.config.is_some()
        || !args.apis.is_empty()
        || !args.options.is_empty()
        || !args.sources.is_empty();
    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => BuildConfig::default(),
    };
    for option in &args.options {
        config.option.insert(option.clone(), true);
    }

    let current_machine = if planning {
        config.current_machine && !config.disabled
    } else {
        matches!(args.mode, Mode::CurrentMachine)
    };
    let processor = match (&args.arch, current_machine) {
        (Some(_), true) => bail!("--arch cannot be combined with a current-machine build"),
        (None, _) => resolver::processor(Target::Current),
        (Some(tag), false) => resolver::architecture_from_platform(tag)
            .and_then(|arch| resolver::processor(Target::Named(arch))),
    }
    .context("Failed to resolve processor")?;
    let profile = resolver::toolchain(args.compiler.as_deref().into(), args.compiler_version)
        .context("Failed to resolve compiler")?;
    info!(
        "{:?} {} processor, compiler {} {}, {} capabilities",
        processor.origin(),
        processor.architecture(),
        profile.id(),
        profile.version().map_or_else(|| "(version unknown)".to_owned(), |v| v.to_string()),
        profile.capabilities().len()
    );

    if !planning {
        let matrix = profile.argument_matrix(&processor)?;
        for group in matrix.groups() {
            debug!(
                "group '{}' ({:?}): {} candidates",
                group.label(),
                group.selection(),
                group.candidates().len()
            );
        }
        let variants = expand(&matrix, args.mode.into())
            .with_context(|| format!("Failed to expand {} matrix", profile.id()))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&variants)?);
        } else {
            for v in &variants {
                let name = if v.is_default() { "<default>" } else { v.name.as_str() };
                println!("{name:<24} {}", v.flags.join(" "));
            }
        }
        return Ok(());
    }

    let mut apis: BTreeSet<String> = args.apis.iter().cloned().collect();
    if !args.sources.is_empty() {
        apis.extend(fatarch::sources::detect_apis(&config, &args.sources)?);
    }

    let request = PlanRequest {
        profile: &profile,
        processor: &processor,
        ext_suffix: &args.ext_suffix,
        apis: &apis,
    };
    let plan = compile_plan(&config, &request).context("Failed to plan build")?;
    let link = link_args(&profile, apis.iter().map(String::as_str), config.enabled_options());

    if args.json {
        let out = serde_json::json!({ "compile": plan, "link": link });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for target in &plan.targets {
            println!("{:<40} {}", target.artifact_suffix, target.compile_args.join(" "));
        }
        println!("{:<40} {}", "<link>", link.join(" "));
    }
    Ok(())
}
