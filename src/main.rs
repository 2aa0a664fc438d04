use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use traffic_etl::config::Config;
use traffic_etl::constants;
use traffic_etl::logging;
use traffic_etl::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "traffic-etl")]
#[command(about = "Daily traffic-sensor data ETL pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured data root
    #[arg(long)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: prepare, fetch, extract, project, combine, transform
    Run {
        /// Nominal run date (YYYY-MM-DD); defaults to today in UTC
        #[arg(long)]
        run_date: Option<chrono::NaiveDate>,
    },
    /// Create the working directories
    Prepare,
    /// Download the source archive
    Fetch,
    /// Unpack the downloaded archive
    Extract,
    /// Project columns from the extracted source files
    Project {
        /// Specific source to project (comma-separated). Available: vehicle, tollplaza, payment
        #[arg(long)]
        source: Option<String>,
    },
    /// Concatenate the projected files column-wise
    Combine,
    /// Uppercase the designated column of the combined file
    Transform,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    let mut config = Config::from_path(&cli.config)?;
    if let Some(data_root) = cli.data_root {
        config.workspace.data_root = data_root;
    }
    let pipeline = Pipeline::new(config);

    match cli.command {
        Commands::Run { run_date } => {
            let run_date = run_date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            println!("🔄 Running traffic data pipeline for {run_date}...");
            match pipeline.run(run_date).await {
                Ok(summary) => {
                    println!("\n📊 Pipeline Results (run {}):", summary.run_id);
                    println!(
                        "   Archive: {} bytes, sha256 {}",
                        summary.archive.bytes_written, summary.archive.sha256
                    );
                    println!("   Extracted members: {}", summary.extracted_members);
                    for stage in &summary.stages {
                        match stage.rows {
                            Some(rows) => println!(
                                "   {:<20} {:>7} rows  {:>6} ms",
                                stage.stage, rows, stage.duration_ms
                            ),
                            None => println!(
                                "   {:<20} {:>7}       {:>6} ms",
                                stage.stage, "-", stage.duration_ms
                            ),
                        }
                    }
                    println!("   Output file: {}", summary.output_file);
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    anyhow::bail!(e);
                }
            }
        }
        Commands::Prepare => {
            pipeline.prepare()?;
            println!("📁 Workspace ready at {}", pipeline.paths().data_root.display());
        }
        Commands::Fetch => {
            pipeline.prepare()?;
            let report = pipeline.fetch().await?;
            println!(
                "📡 Downloaded {} bytes in {} attempt(s) to {}",
                report.bytes_written,
                report.attempts,
                pipeline.paths().archive.display()
            );
        }
        Commands::Extract => {
            let members = pipeline.extract()?;
            println!(
                "📦 Extracted {} member(s) into {}",
                members.len(),
                pipeline.paths().extract_dir.display()
            );
        }
        Commands::Project { source } => {
            if let Some(source_list) = source {
                for name in source_list.split(',').map(str::trim) {
                    if !constants::get_supported_sources().contains(&name) {
                        println!("⚠️  Unknown source: {name}");
                        anyhow::bail!("unknown source: {name}");
                    }
                    let rows = pipeline.project(name)?;
                    println!("✂️  Projected {rows} row(s) from {name}");
                }
            } else {
                for report in pipeline.project_all().await? {
                    println!(
                        "✂️  {:<20} {:>7} row(s)  {:>6} ms",
                        report.stage,
                        report.rows.unwrap_or(0),
                        report.duration_ms
                    );
                }
            }
        }
        Commands::Combine => {
            let rows = pipeline.combine()?;
            println!(
                "🔗 Combined {} row(s) into {}",
                rows,
                pipeline.paths().combined_output.display()
            );
        }
        Commands::Transform => {
            let rows = pipeline.transform()?;
            println!(
                "🔠 Transformed {} row(s) into {}",
                rows,
                pipeline.paths().transformed_output.display()
            );
        }
    }

    info!("done");
    Ok(())
}
