//! keysplit CLI: plan, validate, and explain splits for a YAML cluster layout.

use clap::{Args, Parser, Subcommand};
use keysplit_core::config::{Grouping, PlannerConfig};
use keysplit_core::id::IdAllocator;
use keysplit_planner::{parse_yaml_layout, LayoutConfig, ParsedLayout, Query, SplitPlanner};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "keysplit")]
#[command(about = "Magnitude-balanced, locality-aware input split planning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan splits for a layout and print the manifest and splits as JSON
    Plan {
        /// Path to the layout YAML file
        #[arg(short, long)]
        layout: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Validate a layout YAML file
    Validate {
        /// Path to the layout YAML file
        #[arg(short, long)]
        layout: PathBuf,
    },

    /// Show the initial units and their magnitudes before balancing
    Explain {
        /// Path to the layout YAML file
        #[arg(short, long)]
        layout: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Flags that take precedence over the environment and the layout's `config:`.
#[derive(Args, Debug, Default, Clone)]
struct Overrides {
    /// Grow the plan to at least this many splits
    #[arg(long)]
    min_splits: Option<usize>,

    /// Shrink the plan to at most this many splits (0 = unbounded)
    #[arg(long)]
    max_splits: Option<usize>,

    /// Initial unit grouping: location or extent
    #[arg(long)]
    grouping: Option<Grouping>,

    /// Ceiling on location attempts per index
    #[arg(long)]
    retry_max_attempts: Option<u32>,
}

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "keysplit=info";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { layout, overrides } => {
            if let Err(e) = plan_layout(&layout, &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { layout } => match validate_layout(&layout) {
            Ok(count) => println!("✓ Layout is valid ({} indices to plan)", count),
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Explain { layout, overrides } => {
            if let Err(e) = explain_layout(&layout, &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn load(layout_path: &PathBuf) -> Result<ParsedLayout, Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(layout_path)?;
    Ok(parse_yaml_layout(&yaml_content)?)
}

/// defaults < environment < layout `config:` < flags
fn resolve_config(
    base: PlannerConfig,
    layout: &LayoutConfig,
    overrides: &Overrides,
) -> keysplit_core::error::Result<PlannerConfig> {
    let mut config = base;
    layout.apply_to(&mut config);
    if let Some(min) = overrides.min_splits {
        config.min_splits = Some(min);
    }
    if let Some(max) = overrides.max_splits {
        config.max_splits = Some(max);
    }
    if let Some(grouping) = overrides.grouping {
        config.grouping = grouping;
    }
    if let Some(attempts) = overrides.retry_max_attempts {
        config.retry_max_attempts = Some(attempts);
    }
    config.validate()?;
    Ok(config)
}

fn plan_layout(
    layout_path: &PathBuf,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = load(layout_path)?;
    let config = resolve_config(PlannerConfig::from_env(), &parsed.config, overrides)?;
    let (min_splits, max_splits) = (config.min_splits, config.max_splits);
    info!(?min_splits, ?max_splits, grouping = ?config.grouping, "planning layout");

    let planner = SplitPlanner::new(parsed.locator, parsed.translator).with_config(config);
    let query: &dyn Query = &parsed.query;
    let (splits, manifest) =
        planner.plan_with_manifest(&parsed.indices, Some(query), min_splits, max_splits)?;

    let out = serde_json::json!({
        "manifest": manifest,
        "splits": splits,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn validate_layout(layout_path: &PathBuf) -> Result<usize, Box<dyn std::error::Error>> {
    let parsed = load(layout_path)?;
    resolve_config(PlannerConfig::default(), &parsed.config, &Overrides::default())?;
    Ok(parsed.indices.len())
}

fn explain_layout(
    layout_path: &PathBuf,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = load(layout_path)?;
    let config = resolve_config(PlannerConfig::from_env(), &parsed.config, overrides)?;
    let max_splits = config.max_splits;
    let planner = SplitPlanner::new(parsed.locator, parsed.translator).with_config(config);
    let query: &dyn Query = &parsed.query;
    let ids = IdAllocator::new();
    let set = planner.initial_units(&parsed.indices, Some(query), max_splits, &ids)?;

    println!("Initial Split Units");
    println!("===================");
    println!();
    println!("Indices: {}", parsed.indices.len());
    println!("Units: {}", set.len());
    println!("Cardinality: {} bytes", set.cardinality());
    println!();
    for (i, (magnitude, unit)) in set.magnitudes().enumerate() {
        let split = unit.to_final_split();
        println!(
            "  {}. {} - magnitude {} - {} ranges @ {}",
            i + 1,
            unit.id(),
            magnitude,
            split.range_count(),
            split.locations.join(", ")
        );
        for (index, range) in split.iter_ranges() {
            println!("       {} {}", index, range);
        }
    }
    Ok(())
}
