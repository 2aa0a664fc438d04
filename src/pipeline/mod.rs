pub mod combine;
pub mod extract;
pub mod fetch;
pub mod project;
pub mod transform;
pub mod workspace;

use crate::config::Config;
use crate::constants;
use crate::error::{EtlError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

use fetch::{FetchOptions, FetchReport};
use workspace::WorkspacePaths;

/// Row count and timing for one executed stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: String,
    /// Data rows written by the stage; `None` for stages without tabular output
    pub rows: Option<usize>,
    pub duration_ms: u64,
}

/// Result of a complete pipeline run, serialized to `run_summary.json` under
/// the data root.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub archive: FetchReport,
    pub extracted_members: usize,
    pub stages: Vec<StageReport>,
    pub output_file: String,
}

/// The stage graph: prepare → fetch → extract → {vehicle, tollplaza, payment}
/// → combine → transform. The three projections fan out onto blocking worker
/// threads and are joined before combine; everything else is sequential.
pub struct Pipeline {
    config: Config,
    paths: WorkspacePaths,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let paths = WorkspacePaths::from_config(&config);
        Self { config, paths }
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: std::time::Duration::from_secs(self.config.source.timeout_seconds),
            retries: self.config.source.retries,
            retry_delay: std::time::Duration::from_secs(self.config.source.retry_delay_seconds),
        }
    }

    pub fn prepare(&self) -> Result<()> {
        workspace::prepare_workspace(&self.paths)
    }

    pub async fn fetch(&self) -> Result<FetchReport> {
        fetch::fetch_archive(
            &self.config.source.url,
            &self.paths.archive,
            &self.fetch_options(),
        )
        .await
    }

    pub fn extract(&self) -> Result<Vec<PathBuf>> {
        extract::extract_archive(&self.paths.archive, &self.paths.extract_dir)
    }

    /// Run a single projection by source name.
    pub fn project(&self, source: &str) -> Result<usize> {
        match source {
            constants::VEHICLE_SOURCE => {
                let p = &self.config.projections.vehicle;
                project::project_delimited(
                    &self.paths.vehicle_source,
                    &self.paths.vehicle_output,
                    p.delimiter as u8,
                    &p.columns,
                )
            }
            constants::TOLLPLAZA_SOURCE => {
                let p = &self.config.projections.tollplaza;
                project::project_delimited(
                    &self.paths.tollplaza_source,
                    &self.paths.tollplaza_output,
                    p.delimiter as u8,
                    &p.columns,
                )
            }
            constants::PAYMENT_SOURCE => {
                let p = &self.config.projections.payment;
                project::project_fixed_width(
                    &self.paths.payment_source,
                    &self.paths.payment_output,
                    &p.ranges,
                )
            }
            other => Err(EtlError::UnknownSource(other.to_string())),
        }
    }

    /// Run the three projections concurrently. The sources share no state and
    /// write distinct outputs; the join here is the barrier before combine.
    pub async fn project_all(&self) -> Result<Vec<StageReport>> {
        let vehicle = self.config.projections.vehicle.clone();
        let vehicle_in = self.paths.vehicle_source.clone();
        let vehicle_out = self.paths.vehicle_output.clone();
        let vehicle_task = tokio::task::spawn_blocking(move || {
            timed_projection(constants::STAGE_PROJECT_VEHICLE, || {
                project::project_delimited(
                    &vehicle_in,
                    &vehicle_out,
                    vehicle.delimiter as u8,
                    &vehicle.columns,
                )
            })
        });

        let tollplaza = self.config.projections.tollplaza.clone();
        let tollplaza_in = self.paths.tollplaza_source.clone();
        let tollplaza_out = self.paths.tollplaza_output.clone();
        let tollplaza_task = tokio::task::spawn_blocking(move || {
            timed_projection(constants::STAGE_PROJECT_TOLLPLAZA, || {
                project::project_delimited(
                    &tollplaza_in,
                    &tollplaza_out,
                    tollplaza.delimiter as u8,
                    &tollplaza.columns,
                )
            })
        });

        let payment = self.config.projections.payment.clone();
        let payment_in = self.paths.payment_source.clone();
        let payment_out = self.paths.payment_output.clone();
        let payment_task = tokio::task::spawn_blocking(move || {
            timed_projection(constants::STAGE_PROJECT_PAYMENT, || {
                project::project_fixed_width(&payment_in, &payment_out, &payment.ranges)
            })
        });

        let (vehicle, tollplaza, payment) =
            tokio::try_join!(vehicle_task, tollplaza_task, payment_task)?;
        Ok(vec![vehicle?, tollplaza?, payment?])
    }

    pub fn combine(&self) -> Result<usize> {
        combine::combine_columns(
            &[
                &self.paths.vehicle_output,
                &self.paths.tollplaza_output,
                &self.paths.payment_output,
            ],
            &self.paths.combined_output,
        )
    }

    pub fn transform(&self) -> Result<usize> {
        transform::uppercase_column(
            &self.paths.combined_output,
            &self.paths.transformed_output,
            self.config.transform.column,
        )
    }

    /// Run the whole stage graph in dependency order. The first failing stage
    /// aborts the run; downstream stages never execute.
    #[instrument(skip(self), fields(run_date = %run_date))]
    pub async fn run(&self, run_date: NaiveDate) -> Result<RunSummary> {
        counter!("etl_runs_total").increment(1);
        match self.run_graph(run_date).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                counter!("etl_run_failures_total").increment(1);
                error!(error = %e, "pipeline run failed");
                Err(e)
            }
        }
    }

    async fn run_graph(&self, run_date: NaiveDate) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "starting pipeline run");

        let mut stages: Vec<StageReport> = Vec::new();

        let t = Instant::now();
        self.prepare()?;
        record_stage(&mut stages, stage_report(constants::STAGE_PREPARE, None, t));

        let t = Instant::now();
        let archive = self.fetch().await?;
        record_stage(&mut stages, stage_report(constants::STAGE_FETCH, None, t));

        let t = Instant::now();
        let members = self.extract()?;
        record_stage(&mut stages, stage_report(constants::STAGE_EXTRACT, None, t));

        for report in self.project_all().await? {
            record_stage(&mut stages, report);
        }

        let t = Instant::now();
        let combined_rows = self.combine()?;
        record_stage(
            &mut stages,
            stage_report(constants::STAGE_COMBINE, Some(combined_rows), t),
        );

        let t = Instant::now();
        let transformed_rows = self.transform()?;
        record_stage(
            &mut stages,
            stage_report(constants::STAGE_TRANSFORM, Some(transformed_rows), t),
        );

        let summary = RunSummary {
            run_id,
            run_date,
            started_at,
            finished_at: Utc::now(),
            archive,
            extracted_members: members.len(),
            stages,
            output_file: self.paths.transformed_output.display().to_string(),
        };
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&self.paths.summary, json)?;
        info!(
            run_id = %summary.run_id,
            rows = transformed_rows,
            summary = %self.paths.summary.display(),
            "pipeline run complete"
        );
        Ok(summary)
    }
}

fn stage_report(stage: &str, rows: Option<usize>, started: Instant) -> StageReport {
    StageReport {
        stage: stage.to_string(),
        rows,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

fn timed_projection(stage: &str, run: impl FnOnce() -> Result<usize>) -> Result<StageReport> {
    let started = Instant::now();
    let rows = run()?;
    Ok(stage_report(stage, Some(rows), started))
}

fn record_stage(stages: &mut Vec<StageReport>, report: StageReport) {
    counter!("etl_stage_runs_total", "stage" => report.stage.clone()).increment(1);
    histogram!("etl_stage_duration_seconds", "stage" => report.stage.clone())
        .record(report.duration_ms as f64 / 1000.0);
    info!(
        stage = %report.stage,
        rows = ?report.rows,
        duration_ms = report.duration_ms,
        "stage complete"
    );
    stages.push(report);
}
