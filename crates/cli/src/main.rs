use anyhow::{Context, Result, anyhow};
use astreinte_core::config::{Config, DEFAULT_CONFIG_FILE};
use astreinte_core::db::SqliteRepository;
use astreinte_core::engine::{BalancingPolicy, Schedule, build_schedule};
use astreinte_core::roster::{Roster, normalize_name};
use astreinte_core::schema::{
    DayPlan, StandardTemplate, flatten, parse_date, parse_month, week_start,
};
use astreinte_core::store::PreferenceStore;
use astreinte_core::summary::summarize;
use astreinte_core::find_conflicts;
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

mod table;

#[derive(Parser)]
#[command(name = "astreinte")]
#[command(about = "On-call planning CLI", long_about = None)]
struct Cli {
    /// Configuration file (missing file means defaults)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Show or save one person's week
    Week {
        #[command(subcommand)]
        command: WeekCommands,
    },
    /// Show or save a person's standard week template
    Standard {
        #[command(subcommand)]
        command: StandardCommands,
    },
    /// Final schedule of a month
    Schedule {
        /// Month as YYYY-MM
        #[arg(long)]
        month: String,
        /// Overrides the configured balancing policy
        #[arg(long)]
        policy: Option<BalancingPolicy>,
        /// Show the single fallback-chain pick instead of N1/N2
        #[arg(long)]
        fallback: bool,
        #[arg(long)]
        json: bool,
    },
    /// Slots where several people declared the same top tier
    Conflicts {
        #[arg(long)]
        month: String,
        #[arg(long)]
        json: bool,
    },
    /// Declared hours per person over the whole history
    Hours {
        #[arg(long)]
        json: bool,
    },
    /// Write Markdown notes for a month
    Report {
        #[arg(long)]
        month: String,
        /// Output directory (default: from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum WeekCommands {
    /// Print the week, pre-filled from the standard template when unplanned
    Show {
        #[arg(long)]
        person: String,
        /// Any date of the week (default: today)
        #[arg(long)]
        week: Option<String>,
        /// Keep only days of this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Replace the signed-in person's rows for the dates in a JSON file
    Save {
        /// Personal access code
        #[arg(long)]
        code: String,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum StandardCommands {
    Show {
        #[arg(long)]
        person: String,
        #[arg(long)]
        json: bool,
    },
    /// Save a template object, or the first row of a week file
    Save {
        #[arg(long)]
        code: String,
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?.rebased(&cli.config);
    tracing::debug!(db = %config.storage.db_path.display(), policy = ?config.balancing.policy, "configuration loaded");

    match cli.command {
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        Commands::Week { command } => match command {
            WeekCommands::Show {
                person,
                week,
                month,
                json,
            } => week_show(&config, &person, week.as_deref(), month.as_deref(), json),
            WeekCommands::Save { code, file } => week_save(&config, &code, &file),
        },
        Commands::Standard { command } => match command {
            StandardCommands::Show { person, json } => standard_show(&config, &person, json),
            StandardCommands::Save { code, file } => standard_save(&config, &code, &file),
        },
        Commands::Schedule {
            month,
            policy,
            fallback,
            json,
        } => schedule(&config, &month, policy, fallback, json),
        Commands::Conflicts { month, json } => conflicts(&config, &month, json),
        Commands::Hours { json } => hours(&config, json),
        Commands::Report { month, out_dir } => report(&config, &month, out_dir),
    }
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let schemas = [
        ("DayPlan", schema_for!(astreinte_core::schema::DayPlan)),
        ("StandardTemplate", schema_for!(astreinte_core::schema::StandardTemplate)),
        ("Declaration", schema_for!(astreinte_core::schema::Declaration)),
        ("Conflict", schema_for!(astreinte_core::conflicts::Conflict)),
        ("Schedule", schema_for!(astreinte_core::engine::Schedule)),
        ("PersonSummary", schema_for!(astreinte_core::summary::PersonSummary)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

fn open_store(config: &Config) -> Result<PreferenceStore<SqliteRepository>> {
    let repo = SqliteRepository::open(&config.storage.db_path)
        .with_context(|| format!("opening {}", config.storage.db_path.display()))?;
    Ok(PreferenceStore::new(repo))
}

/// Resolves the current user from an access code; writes need one.
fn current_user(config: &Config, code: &str) -> Result<String> {
    let roster = Roster::load(&config.roster.path)?;
    let name = roster
        .identify(code)
        .ok_or_else(|| anyhow!("Unknown access code: sign-in required to save"))?;
    normalize_name(name).ok_or_else(|| anyhow!("Roster entry for this code has an empty name"))
}

fn person_arg(raw: &str) -> Result<String> {
    normalize_name(raw).ok_or_else(|| anyhow!("Person name cannot be empty"))
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn week_show(
    config: &Config,
    person: &str,
    week: Option<&str>,
    month: Option<&str>,
    json: bool,
) -> Result<()> {
    let person = person_arg(person)?;
    let day = week.map(parse_date).transpose()?.unwrap_or_else(today);
    let store = open_store(config)?;
    let rows = match month {
        Some(month) => {
            let month = parse_month(month)?.start.month();
            store.week_for_in_month(&person, day, month)?
        }
        None => store.week_for(&person, day)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("Week of {} for {person}", table::date(week_start(day)));
        print!("{}", table::plans(&rows));
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}

fn week_save(config: &Config, code: &str, file: &Path) -> Result<()> {
    let person = current_user(config, code)?;
    let rows: Vec<DayPlan> = read_json(file)?;
    let mut store = open_store(config)?;
    let saved = store.save_week(&person, &rows)?;
    println!("Saved {saved} day(s) for {person}");
    Ok(())
}

fn standard_show(config: &Config, person: &str, json: bool) -> Result<()> {
    let person = person_arg(person)?;
    let template = open_store(config)?.standard(&person)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&template)?);
    } else {
        print!("{}", table::template(&template));
    }
    Ok(())
}

fn standard_save(config: &Config, code: &str, file: &Path) -> Result<()> {
    let person = current_user(config, code)?;
    let value: serde_json::Value = read_json(file)?;
    let mut store = open_store(config)?;
    if value.is_array() {
        let rows: Vec<DayPlan> = serde_json::from_value(value)?;
        store.save_standard_from_rows(&person, &rows)?;
    } else {
        let template: StandardTemplate = serde_json::from_value(value)?;
        store.save_standard(&person, template.labels)?;
    }
    println!("Standard planning saved for {person}");
    Ok(())
}

fn month_schedule(config: &Config, month: &str, policy: BalancingPolicy) -> Result<Schedule> {
    let range = parse_month(month)?;
    let history = flatten(&open_store(config)?.history()?);
    Ok(build_schedule(&history, range, policy))
}

fn schedule(
    config: &Config,
    month: &str,
    policy: Option<BalancingPolicy>,
    fallback: bool,
    json: bool,
) -> Result<()> {
    let policy = policy.unwrap_or(config.balancing.policy);
    let schedule = month_schedule(config, month, policy)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        print!("{}", table::schedule(&schedule, fallback));
    }
    Ok(())
}

fn conflicts(config: &Config, month: &str, json: bool) -> Result<()> {
    let range = parse_month(month)?;
    let history = flatten(&open_store(config)?.history()?);
    let found = find_conflicts(history.iter().filter(|d| range.contains(d.date)));
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else if found.is_empty() {
        println!("No conflict detected for this period");
    } else {
        print!("{}", table::conflicts(&found));
    }
    Ok(())
}

fn hours(config: &Config, json: bool) -> Result<()> {
    let history = flatten(&open_store(config)?.history()?);
    let summary = summarize(&history);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", table::hours(&summary));
    }
    Ok(())
}

fn report(config: &Config, month: &str, out_dir: Option<PathBuf>) -> Result<()> {
    let range = parse_month(month)?;
    let history = flatten(&open_store(config)?.history()?);
    let schedule = build_schedule(&history, range, config.balancing.policy);
    let found = find_conflicts(history.iter().filter(|d| range.contains(d.date)));
    let out_dir = out_dir.unwrap_or_else(|| config.report.out_dir.clone());

    let path = planning_report::build_report(&out_dir, &schedule, &found, &summarize(&history))?;
    println!("Report written to {}", path.display());
    Ok(())
}
