//! maqam - transposition search and chromatic classification from the shell
//!
//! Subcommands:
//! - `maqam transpositions` - Every realization of a maqam or jins in a tuning
//! - `maqam can-transpose` - Whether a template can start on a given note
//! - `maqam classify` - Group all maqam transpositions by chromatic set
//! - `maqam family` - Name each maqam's family after its first jins

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use maqam_core::{AnalysisConfig, Catalog};

mod commands;

#[derive(Parser)]
#[command(name = "maqam")]
#[command(about = "Maqam transposition search and 12-tone classification")]
#[command(version)]
struct Cli {
    /// JSON catalog of tuning systems, ajnas and maqamat
    #[arg(long, env = "MAQAM_CATALOG", global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Config file used in place of ./maqam.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cents tolerance, overriding config
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

/// Which template a command works on.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct TemplateArg {
    /// Maqam id
    #[arg(long)]
    maqam: Option<String>,

    /// Jins id
    #[arg(long)]
    jins: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every realization of a maqam or jins
    Transpositions {
        /// Tuning system id
        #[arg(short, long)]
        tuning: String,

        /// Note the tuning system is laid out from
        #[arg(short, long)]
        starting_note: String,

        #[command(flatten)]
        template: TemplateArg,

        /// Only realizations starting in octave one
        #[arg(long)]
        octave_one: bool,

        /// Leave out the untransposed form
        #[arg(long)]
        no_tahlil: bool,
    },

    /// Check whether a maqam or jins can start on a note
    CanTranspose {
        /// Tuning system id
        #[arg(short, long)]
        tuning: String,

        /// Note the tuning system is laid out from
        #[arg(short, long)]
        starting_note: String,

        #[command(flatten)]
        template: TemplateArg,

        /// Note the transposition should start on
        target: String,
    },

    /// Partition every maqam transposition into chromatic sets
    Classify {
        /// Tuning system id
        #[arg(short, long)]
        tuning: String,

        /// Note the tuning system is laid out from
        #[arg(short, long)]
        starting_note: String,

        /// Baseline tuning system id, overriding config
        #[arg(long)]
        baseline: Option<String>,

        /// Baseline starting note, overriding config
        #[arg(long)]
        baseline_note: Option<String>,

        /// Group by each instance's own letters instead of full 12-tone sets
        #[arg(long)]
        own_sets: bool,

        /// Sweep limit, overriding config
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Classify maqamat by the jins on their first degree
    Family {
        /// Tuning system id
        #[arg(short, long)]
        tuning: String,

        /// Note the tuning system is laid out from
        #[arg(short, long)]
        starting_note: String,

        /// Only this maqam id
        #[arg(long)]
        maqam: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AnalysisConfig::load_from(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(tolerance) = cli.tolerance {
        config.cents_tolerance = tolerance;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                config
                    .log_level
                    .parse()
                    .with_context(|| format!("Invalid log level: {}", config.log_level))?,
            ),
        )
        .init();

    let catalog = Catalog::from_path(&cli.catalog)
        .with_context(|| format!("Failed to load catalog: {}", cli.catalog.display()))?;

    match cli.command {
        Commands::Transpositions {
            tuning,
            starting_note,
            template,
            octave_one,
            no_tahlil,
        } => {
            commands::transpositions(
                &catalog,
                &config,
                &tuning,
                &starting_note,
                &template.resolve()?,
                commands::Listing { octave_one, no_tahlil },
            )?;
        }
        Commands::CanTranspose {
            tuning,
            starting_note,
            template,
            target,
        } => {
            commands::can_transpose(&catalog, &config, &tuning, &starting_note, &template.resolve()?, &target)?;
        }
        Commands::Classify {
            tuning,
            starting_note,
            baseline,
            baseline_note,
            own_sets,
            max_iterations,
        } => {
            if let Some(tuning_system) = baseline {
                config.baseline.tuning_system = tuning_system;
            }
            if let Some(note) = baseline_note {
                config.baseline.starting_note = note;
            }
            if let Some(max) = max_iterations {
                config.max_iterations = max;
            }
            commands::classify(&catalog, &config, &tuning, &starting_note, own_sets)?;
        }
        Commands::Family {
            tuning,
            starting_note,
            maqam,
        } => {
            commands::family(&catalog, &config, &tuning, &starting_note, maqam.as_deref())?;
        }
    }

    Ok(())
}

impl TemplateArg {
    fn resolve(self) -> Result<commands::Template> {
        match (self.maqam, self.jins) {
            (Some(id), _) => Ok(commands::Template::Maqam(id)),
            (None, Some(id)) => Ok(commands::Template::Jins(id)),
            (None, None) => bail!("One of --maqam or --jins is required"),
        }
    }
}
