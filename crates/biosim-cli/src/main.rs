//! Command-line runner for island simulations.

mod logging;

use anyhow::{Context, Result};
use biosim_core::{PopulationEntry, ScenarioConfig, Species, SpeciesSummary};
use biosim_world::IslandScenario;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "biosim")]
#[command(version)]
#[command(about = "Year-by-year predator/prey population dynamics on a grid island")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print one JSON line per simulated year
    Run {
        /// Scenario file (JSON)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the number of years
        #[arg(short, long)]
        years: Option<u32>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Species parameter override, e.g. `Herbivore={"F":20}`. Repeatable.
        #[arg(short, long = "params", value_name = "SPECIES=JSON", value_parser = parse_species_override)]
        params: Vec<(Species, Value)>,

        /// Print only the final summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write an example scenario file
    Init {
        /// Output path
        #[arg(short, long, default_value = "scenario.json")]
        output: PathBuf,
    },
}

/// One line of the yearly output
#[derive(Serialize)]
struct YearLine {
    year: u32,
    herbivores: SpeciesSummary,
    carnivores: SpeciesSummary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json)?;

    match cli.command {
        Commands::Run {
            scenario,
            years,
            seed,
            params,
            quiet,
        } => run(scenario, years, seed, params, quiet),
        Commands::Init { output } => init(output),
    }
}

fn run(
    path: PathBuf,
    years: Option<u32>,
    seed: Option<u64>,
    overrides: Vec<(Species, Value)>,
    quiet: bool,
) -> Result<()> {
    let mut config = ScenarioConfig::load(&path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    if let Some(years) = years {
        config.years = years;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    for (species, update) in overrides {
        merge_species_params(&mut config, species, update);
    }
    info!(scenario = %path.display(), seed = config.seed, years = config.years, "Running scenario");

    let scenario = IslandScenario::new(config);
    let mut sim = scenario.build().context("invalid scenario")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;

    sim.simulate_with(scenario.config.years, |grid, stats| {
        if quiet || write_error.is_some() {
            return;
        }
        let snapshot = grid.statistics();
        let line = YearLine {
            year: stats.year,
            herbivores: snapshot.herbivores.summary(),
            carnivores: snapshot.carnivores.summary(),
        };
        if let Err(e) = write_line(&mut out, &line) {
            write_error = Some(e);
        }
    });
    if let Some(e) = write_error {
        return Err(e.context("failed to write yearly output"));
    }

    if quiet {
        let final_stats = sim.statistics();
        let line = YearLine {
            year: sim.year(),
            herbivores: final_stats.herbivores.summary(),
            carnivores: final_stats.carnivores.summary(),
        };
        write_line(&mut out, &line)?;
    }
    Ok(())
}

/// Parse `SPECIES=JSON` into a species and its parameter object
fn parse_species_override(arg: &str) -> Result<(Species, Value)> {
    let (name, json) = arg
        .split_once('=')
        .context("expected SPECIES=JSON")?;
    let species: Species = name.trim().parse()?;
    let update = serde_json::from_str(json)
        .with_context(|| format!("invalid parameters for {}", species))?;
    Ok((species, update))
}

/// Command-line keys win over the scenario file's keys
fn merge_species_params(config: &mut ScenarioConfig, species: Species, update: Value) {
    let entry = config
        .species_params
        .entry(species)
        .or_insert_with(|| Value::Object(Default::default()));
    match (entry, update) {
        (Value::Object(existing), Value::Object(update)) => existing.extend(update),
        (entry, update) => *entry = update,
    }
}

fn write_line(out: &mut impl Write, line: &YearLine) -> Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out)?;
    Ok(())
}

fn init(output: PathBuf) -> Result<()> {
    let config = ScenarioConfig {
        seed: 12345,
        island_map: [
            "WWWWWWWWWWWWWWWWWWWWW",
            "WHHHHHLLLLWWLLLLLLLWW",
            "WHHHHHLLLLWWLLLLLLLWW",
            "WHHHHHLLLLWWLLLLLLLWW",
            "WWHHLLLLLLLWWLLLLLLLW",
            "WWHHLLLLLLLWWLLLLLLLW",
            "WWWWWWWWHWWWWLLLLLLLW",
            "WHHHHHLLLLWWLLLLLLLWW",
            "WHHHHHHHHHWWLLLLLLWWW",
            "WHHHHHDDDDDLLLLLLLWWW",
            "WHHHHHDDDDDLLLLLLLWWW",
            "WHHHHHDDDDDLLLLLLLWWW",
            "WHHHHHDDDDDWWLLLLLWWW",
            "WHHHHDDDDDDLLLLWWWWWW",
            "WWHHHHDDDDDDLWWWWWWWW",
            "WWHHHHDDDDDLLLWWWWWWW",
            "WHHHHHDDDDDLLLLLLLWWW",
            "WHHHHDDDDDDLLLLWWWWWW",
            "WWHHHHDDDDDLLLWWWWWWW",
            "WWWHHHHLLLLLLLWWWWWWW",
            "WWWHHHHHHWWWWWWWWWWWW",
            "WWWWWWWWWWWWWWWWWWWWW",
        ]
        .join("\n"),
        ini_pop: vec![
            PopulationEntry::uniform((2, 7), Species::Herbivore, 200, 5, 20.0),
            PopulationEntry::uniform((2, 7), Species::Carnivore, 50, 5, 20.0),
        ],
        years: 400,
        ..Default::default()
    };

    // Reject an example that would not load
    let geography =
        biosim_world::Geography::parse(&config.island_map).context("example map is invalid")?;
    let config = ScenarioConfig {
        island_map: geography.to_string(),
        ..config
    };

    let json = serde_json::to_string_pretty(&config)?;
    std::fs::write(&output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), "Scenario written");
    Ok(())
}
