use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use rtt_waits::utils::io::write_csv;
use rtt_waits::utils::logging::console::{
    print_duplicates, print_grouped_summary, print_summary_pivot,
};
use rtt_waits::{GroupKey, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "rtt-waits")]
#[command(about = "Clean RTT waiting times and summarise them by deprivation and ethnicity")]
#[command(version)]
struct Cli {
    /// Spreadsheet holding the RTT records (xlsx, xls or ods)
    #[arg(long)]
    input: PathBuf,
    /// Sheet to read; overrides the configuration file
    #[arg(long)]
    sheet: Option<String>,
    /// Pipeline configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ethnicity mapping artifact (TOML); overrides the configuration file
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// Smallest waiting time kept, inclusive
    #[arg(long)]
    min_waiting_days: Option<i64>,
    /// Waiting time bound, exclusive
    #[arg(long)]
    max_waiting_days: Option<i64>,
    /// Directory for CSV, Parquet and JSON outputs
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Grouping for the printed summary
    #[arg(long, value_enum, default_value_t = GroupBy::ImdEthnicity)]
    group_by: GroupBy,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupBy {
    ImdEthnicity,
    Imd,
    Ethnicity,
    AgeBand,
}

impl GroupBy {
    const fn key(self) -> Option<GroupKey> {
        match self {
            Self::ImdEthnicity => None,
            Self::Imd => Some(GroupKey::Imd),
            Self::Ethnicity => Some(GroupKey::Ethnicity),
            Self::AgeBand => Some(GroupKey::AgeBand),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(sheet) = &cli.sheet {
        config.loader.sheet_name.clone_from(sheet);
    }
    if let Some(mapping) = &cli.mapping {
        config.mapping_path = Some(mapping.clone());
    }
    if let Some(min) = cli.min_waiting_days {
        config.thresholds.min_waiting_days = min;
    }
    if let Some(max) = cli.max_waiting_days {
        config.thresholds.max_waiting_days = max;
    }
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let pipeline = Pipeline::new(config).context("preparing pipeline")?;

    info!("Processing {}", cli.input.display());
    let output = pipeline
        .run(&cli.input)
        .with_context(|| format!("processing {}", cli.input.display()))?;

    print_duplicates(&output.duplicates, 10);
    println!();
    print!("{}", output.report()?);
    println!();

    let grouped = cli.group_by.key().map(|key| output.summarize_by(key)).transpose()?;
    match &grouped {
        Some(grouped) => print_grouped_summary(grouped),
        None => print_summary_pivot(&output.summary),
    }

    if let Some(out_dir) = &cli.out_dir {
        let files = output
            .export(out_dir)
            .with_context(|| format!("exporting to {}", out_dir.display()))?;
        if let Some(grouped) = &grouped {
            let path = out_dir.join(format!("summary_by_{}.csv", grouped.key.column_name()));
            write_csv(&grouped.to_record_batch()?, &path)?;
            info!("Wrote {}", path.display());
        }
        for path in files.paths() {
            info!("Wrote {}", path.display());
        }
    }

    Ok(())
}
