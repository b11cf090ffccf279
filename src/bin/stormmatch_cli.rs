//! Stormmatch pipeline driver.
//!
//! Loads the satellite and ground-network CSV files, canonicalizes
//! timestamps, optionally filters the ground stream by date range, runs
//! the fuzzy full outer join, appends scaled intensity columns, prints
//! the physical correlation report as JSON, and writes the joined table.

use clap::Parser;
use log::{info, warn};

use stormmatch::stormmatch::analysis::{add_intensity_scales, analyze_physical_correlation};
use stormmatch::stormmatch::correlate::correlate;
use stormmatch::stormmatch::ingest::{
    canonicalize_event_times, read_csv_file, write_csv_file, CsvFormat, DateRangeFilter,
    FilterGranularity, TimestampParser, DEFAULT_BATCH_SIZE,
};
use stormmatch::{CorrelationConfig, StreamProfile};

#[derive(Parser)]
#[command(name = "stormmatch")]
#[command(about = "Correlate satellite (GLM) and ground-network (ENTLN) lightning event streams")]
#[command(version)]
struct Cli {
    /// Path to the satellite (primary) stream CSV
    #[arg(long)]
    primary: String,

    /// Path to the ground-network (secondary) stream CSV
    #[arg(long)]
    secondary: String,

    /// Output CSV path for the joined table
    #[arg(long, default_value = "joined.csv")]
    output: String,

    /// Matching window half-width in seconds
    #[arg(long, default_value = "30")]
    time_tolerance_secs: i64,

    /// Inclusive distance gate in km
    #[arg(long, default_value = "10.0")]
    distance_tolerance_km: f64,

    /// Use the current's absolute value in the correlation analysis
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    abs_current: bool,

    /// Filter the secondary stream from this date ('%Y-%m-%d' or
    /// '%Y-%m-%d %H:%M:%S')
    #[arg(long)]
    filter_start: Option<String>,

    /// Filter window end (defaults to one granularity unit after start)
    #[arg(long)]
    filter_end: Option<String>,

    /// Filter granularity: 'day' or 'hour'
    #[arg(long, default_value = "day")]
    granularity: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CorrelationConfig::default()
        .with_time_tolerance_secs(cli.time_tolerance_secs)
        .with_distance_tolerance_km(cli.distance_tolerance_km)
        .with_absolute_current(cli.abs_current);
    // Reject bad tolerances and filter settings before touching any data.
    config.validate()?;
    let filter = match &cli.filter_start {
        Some(start) => {
            let granularity: FilterGranularity = cli.granularity.parse()?;
            Some(DateRangeFilter::resolve(
                start,
                cli.filter_end.as_deref(),
                granularity,
            )?)
        }
        None => None,
    };

    let format = CsvFormat::default();
    let glm_profile = StreamProfile::glm();
    let entln_profile = StreamProfile::entln();

    let mut primary = read_csv_file(&cli.primary, &glm_profile, &format)?;
    let mut secondary = read_csv_file(&cli.secondary, &entln_profile, &format)?;

    let parser = TimestampParser::default();
    canonicalize_event_times(
        &mut primary,
        &glm_profile.time_field,
        &parser,
        DEFAULT_BATCH_SIZE,
    );
    canonicalize_event_times(
        &mut secondary,
        &entln_profile.time_field,
        &parser,
        DEFAULT_BATCH_SIZE,
    );

    if let Some(filter) = filter {
        filter.apply(&mut secondary);
    }

    let mut joined = correlate(&primary, &secondary, &config)?;
    info!("joined table: {} rows", joined.rows.len());

    let energy_column = format!("{}_{}", glm_profile.tag, glm_profile.intensity_field);
    let current_column = format!("{}_{}", entln_profile.tag, entln_profile.intensity_field);
    add_intensity_scales(
        &mut joined,
        &[energy_column.clone(), current_column.clone()],
    )?;

    match analyze_physical_correlation(
        &joined,
        &energy_column,
        &current_column,
        config.use_absolute_current,
    ) {
        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => warn!("no valid rows for physical correlation"),
    }

    write_csv_file(&cli.output, &joined, &format)?;
    info!("wrote '{}'", cli.output);
    Ok(())
}
