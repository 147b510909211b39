//! Race configuration files.

use std::path::Path;

use anyhow::{Context, Result};
use derby_timing::RaceConfig;
use tracing::debug;

use crate::error::CliError;

/// Load the configuration from `path` (defaults when absent), then apply the
/// `--lanes` override.
pub fn load(path: Option<&Path>, lanes: Option<u8>) -> Result<RaceConfig> {
    let mut config = match path {
        Some(path) => read(path)?,
        None => RaceConfig::default(),
    };
    if let Some(lanes) = lanes {
        config
            .set_lane_count(lanes)
            .map_err(CliError::from)
            .context("applying --lanes")?;
    }
    Ok(config)
}

/// Read and validate a YAML configuration file. Missing keys take defaults.
pub fn read(path: &Path) -> Result<RaceConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(CliError::from)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: RaceConfig = serde_yaml::from_str(&text)
        .map_err(CliError::from)
        .with_context(|| format!("parsing {}", path.display()))?;
    config
        .validate()
        .map_err(CliError::from)
        .with_context(|| format!("validating {}", path.display()))?;
    debug!(path = %path.display(), ?config, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn yaml_file(contents: &str) -> std::io::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn partial_file_takes_defaults() -> TestResult {
        let file = yaml_file("lane_count: 4\ndecimal_places: 3\n")?;
        let config = read(file.path())?;
        assert_eq!(config.lane_count(), 4);
        assert_eq!(config.decimal_places(), 3);
        assert_eq!(config.tie_allowance(), 1);
        Ok(())
    }

    #[test]
    fn out_of_range_value_is_rejected() -> TestResult {
        let file = yaml_file("decimal_places: 7\n")?;
        let err = match read(file.path()) {
            Ok(config) => return Err(format!("accepted {config:?}").into()),
            Err(err) => err,
        };
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidConfiguration(_))
        ));
        Ok(())
    }

    #[test]
    fn lanes_override_applies_after_file() -> TestResult {
        let file = yaml_file("lane_count: 6\n")?;
        let config = load(Some(file.path()), Some(3))?;
        assert_eq!(config.lane_count(), 3);
        Ok(())
    }

    #[test]
    fn defaults_without_file() -> TestResult {
        let config = load(None, None)?;
        assert_eq!(config, RaceConfig::default());
        Ok(())
    }
}
