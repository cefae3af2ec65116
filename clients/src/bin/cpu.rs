//! `fatarch-cpu` prints a processor capability snapshot or the catalog.
//!
//! **Usage:**
//! ```text
//! fatarch-cpu               # the running processor
//! fatarch-cpu --arch amd64  # every feature x86_64 can have
//! fatarch-cpu --catalog     # architectures and compilers as JSON
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use anyhow::{Context, Result};
use clap::Parser;
use fatarch::resolver;
use fatarch_catalog::serializer::json;
use fatarch_catalog::Catalog;

/// Print processor capabilities.
#[derive(Parser)]
#[command(name = "fatarch-cpu", about = "Print processor capabilities")]
struct Args {
    /// Architecture name or alias; prints its static snapshot.
    #[arg(long, conflicts_with = "catalog")]
    arch: Option<String>,

    /// Print the architecture and compiler catalog instead.
    #[arg(long)]
    catalog: bool,

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

    if args.catalog {
        let value = json::to_json(Catalog::full());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let snapshot = resolver::processor(args.arch.as_deref().into())
        .context("Failed to identify processor")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("architecture: {}", snapshot.architecture());
    if !snapshot.vendor().is_empty() {
        println!("vendor:       {}", snapshot.vendor());
    }
    if !snapshot.brand().is_empty() {
        println!("brand:        {}", snapshot.brand());
    }
    if args.arch.is_none() {
        println!(
            "levels:       basic {:#x}, extended {:#x}",
            snapshot.highest_basic_level(),
            snapshot.highest_extended_level()
        );
        println!(
            "os state:     avx {}, avx512 {}",
            snapshot.os_supports_extended_simd(),
            snapshot.os_supports_avx512_state()
        );
    }
    let usable = snapshot.usable_features();
    let unusable: Vec<&str> = snapshot
        .features()
        .iter()
        .map(String::as_str)
        .filter(|f| !usable.contains(f))
        .collect();
    println!("features:     {}", usable.into_iter().collect::<Vec<_>>().join(" "));
    if !unusable.is_empty() {
        println!("disabled:     {}", unusable.join(" "));
    }
    Ok(())
}
