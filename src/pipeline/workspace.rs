use crate::config::Config;
use crate::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Every path a run reads or writes, resolved once from configuration and
/// threaded explicitly through the stages.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub data_root: PathBuf,
    pub archive: PathBuf,
    pub extract_dir: PathBuf,
    pub vehicle_source: PathBuf,
    pub vehicle_output: PathBuf,
    pub tollplaza_source: PathBuf,
    pub tollplaza_output: PathBuf,
    pub payment_source: PathBuf,
    pub payment_output: PathBuf,
    pub combined_output: PathBuf,
    pub transformed_output: PathBuf,
    pub summary: PathBuf,
}

impl WorkspacePaths {
    pub fn from_config(config: &Config) -> Self {
        let data_root = config.workspace.data_root.clone();
        let extract_dir = data_root.join(&config.workspace.extract_dir);
        Self {
            archive: data_root.join(&config.workspace.archive_file),
            vehicle_source: extract_dir.join(&config.projections.vehicle.file),
            vehicle_output: extract_dir.join(&config.projections.vehicle.output),
            tollplaza_source: extract_dir.join(&config.projections.tollplaza.file),
            tollplaza_output: extract_dir.join(&config.projections.tollplaza.output),
            payment_source: extract_dir.join(&config.projections.payment.file),
            payment_output: extract_dir.join(&config.projections.payment.output),
            combined_output: extract_dir.join(&config.combine.output),
            transformed_output: extract_dir.join(&config.transform.output),
            summary: data_root.join("run_summary.json"),
            extract_dir,
            data_root,
        }
    }
}

/// Create the working root and the extraction directory, parents included.
/// Idempotent when the directories already exist.
pub fn prepare_workspace(paths: &WorkspacePaths) -> Result<()> {
    fs::create_dir_all(&paths.extract_dir)?;
    debug!(data_root = %paths.data_root.display(), "workspace ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn prepare_creates_nested_directories() {
        let temp = tempdir().unwrap();
        let mut config = Config::default();
        config.workspace.data_root = temp.path().join("deep").join("traffic");
        let paths = WorkspacePaths::from_config(&config);

        prepare_workspace(&paths).unwrap();
        assert!(paths.extract_dir.is_dir());

        // a second run over the same tree succeeds silently
        prepare_workspace(&paths).unwrap();
    }

    #[test]
    fn paths_derive_from_configured_names() {
        let mut config = Config::default();
        config.workspace.data_root = PathBuf::from("/srv/etl");
        let paths = WorkspacePaths::from_config(&config);

        assert_eq!(paths.archive, PathBuf::from("/srv/etl/trafficdata.tgz"));
        assert_eq!(
            paths.vehicle_source,
            PathBuf::from("/srv/etl/extracted/vehicle-data.csv")
        );
        assert_eq!(
            paths.transformed_output,
            PathBuf::from("/srv/etl/extracted/transformed_data.csv")
        );
        assert_eq!(paths.summary, PathBuf::from("/srv/etl/run_summary.json"));
    }
}
