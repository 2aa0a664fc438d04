use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Pipeline configuration, loaded from a TOML file.
///
/// Every section falls back to compiled defaults, so a partial file (or no
/// file at all) still yields a runnable pipeline against the public traffic
/// data archive.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub projections: ProjectionsConfig,
    #[serde(default)]
    pub combine: CombineConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL of the compressed archive to download
    #[serde(default = "default_url")]
    pub url: String,
    /// Upper bound on the whole transfer, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Bounded retries for transient download failures
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Delay between retries, in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Working root; every artifact of a run lives under this directory
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_archive_file")]
    pub archive_file: String,
    #[serde(default = "default_extract_dir")]
    pub extract_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionsConfig {
    #[serde(default = "default_vehicle")]
    pub vehicle: DelimitedProjection,
    #[serde(default = "default_tollplaza")]
    pub tollplaza: DelimitedProjection,
    #[serde(default = "default_payment")]
    pub payment: FixedWidthProjection,
}

/// Column selection for a delimiter-separated source file.
///
/// The selected indices are opaque domain constants carried over from the
/// upstream data layout; they are configuration, not code.
#[derive(Debug, Clone, Deserialize)]
pub struct DelimitedProjection {
    pub file: String,
    pub output: String,
    pub delimiter: char,
    pub columns: Vec<usize>,
}

/// Character ranges for a fixed-width source file, half-open `[start, end)`.
#[derive(Debug, Clone, Deserialize)]
pub struct FixedWidthProjection {
    pub file: String,
    pub output: String,
    pub ranges: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CombineConfig {
    #[serde(default = "default_combined_file")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_transformed_file")]
    pub output: String,
    /// Zero-based index of the column to uppercase in the combined file
    #[serde(default = "default_transform_column")]
    pub column: usize,
}

fn default_url() -> String {
    "https://elasticbeanstalk-us-east-2-340729127361.s3.us-east-2.amazonaws.com/trafficdata.tgz"
        .to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    300
}

fn default_data_root() -> PathBuf {
    PathBuf::from("/tmp/traffic_data")
}

fn default_archive_file() -> String {
    "trafficdata.tgz".to_string()
}

fn default_extract_dir() -> String {
    "extracted".to_string()
}

fn default_vehicle() -> DelimitedProjection {
    DelimitedProjection {
        file: "vehicle-data.csv".to_string(),
        output: "csv_d.csv".to_string(),
        delimiter: ',',
        columns: vec![0, 1, 2, 3],
    }
}

fn default_tollplaza() -> DelimitedProjection {
    DelimitedProjection {
        file: "tollplaza-data.tsv".to_string(),
        output: "tsv_d.csv".to_string(),
        delimiter: '\t',
        columns: vec![4, 5, 6],
    }
}

fn default_payment() -> FixedWidthProjection {
    FixedWidthProjection {
        file: "payment-data.txt".to_string(),
        output: "fixed_width_d.csv".to_string(),
        ranges: vec![(0, 2), (3, 5)],
    }
}

fn default_combined_file() -> String {
    "combined_data.csv".to_string()
}

fn default_transformed_file() -> String {
    "transformed_data.csv".to_string()
}

fn default_transform_column() -> usize {
    3
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_delay_seconds: default_retry_delay(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            archive_file: default_archive_file(),
            extract_dir: default_extract_dir(),
        }
    }
}

impl Default for ProjectionsConfig {
    fn default() -> Self {
        Self {
            vehicle: default_vehicle(),
            tollplaza: default_tollplaza(),
            payment: default_payment(),
        }
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            output: default_combined_file(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            output: default_transformed_file(),
            column: default_transform_column(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            workspace: WorkspaceConfig::default(),
            projections: ProjectionsConfig::default(),
            combine: CombineConfig::default(),
            transform: TransformConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_upstream_layout() {
        let config = Config::default();
        assert!(config.source.url.ends_with("trafficdata.tgz"));
        assert_eq!(config.source.retries, 1);
        assert_eq!(config.projections.vehicle.columns, vec![0, 1, 2, 3]);
        assert_eq!(config.projections.tollplaza.columns, vec![4, 5, 6]);
        assert_eq!(config.projections.tollplaza.delimiter, '\t');
        assert_eq!(config.projections.payment.ranges, vec![(0, 2), (3, 5)]);
        assert_eq!(config.transform.column, 3);
        assert_eq!(config.combine.output, "combined_data.csv");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let raw = r#"
            [source]
            url = "http://localhost:8080/data.tgz"
            timeout_seconds = 5
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.source.url, "http://localhost:8080/data.tgz");
        assert_eq!(config.source.timeout_seconds, 5);
        // untouched sections fall back
        assert_eq!(config.source.retries, 1);
        assert_eq!(config.workspace.archive_file, "trafficdata.tgz");
        assert_eq!(config.transform.output, "transformed_data.csv");
    }

    #[test]
    fn fixed_width_ranges_parse_from_pairs() {
        let raw = r#"
            [projections.payment]
            file = "payment-data.txt"
            output = "fixed_width_d.csv"
            ranges = [[0, 4], [5, 9], [10, 12]]
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(
            config.projections.payment.ranges,
            vec![(0, 4), (5, 9), (10, 12)]
        );
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = Config::from_path(Path::new("/nonexistent/etl-config.toml")).unwrap();
        assert_eq!(config.workspace.data_root, PathBuf::from("/tmp/traffic_data"));
    }
}
