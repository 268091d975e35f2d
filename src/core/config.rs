use crate::core::record::IndexUnit;
use crate::core::weights::{FamilyWeights, RouteWeightTable, known_family};
use crate::extract::ExtractionStrategy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// One place an index family is published.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(rename = "url")]
    pub locator: String,
    pub strategy: ExtractionStrategy,
    /// Lower runs first; the lowest is the primary source.
    #[serde(default)]
    pub priority: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FamilyConfig {
    pub name: String,
    pub unit: Option<IndexUnit>,
    pub route_weights: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

impl FamilyConfig {
    pub fn default_unit(&self) -> IndexUnit {
        self.unit
            .or_else(|| known_family(&self.name).map(|f| f.default_unit))
            .unwrap_or(IndexUnit::Points)
    }

    pub fn route_weights(&self) -> RouteWeightTable {
        match &self.route_weights {
            Some(weights) => RouteWeightTable::new(weights.clone()),
            None => RouteWeightTable::for_family(&self.name),
        }
    }

    /// Sources in the order they are tried.
    pub fn ordered_sources(&self) -> Vec<SourceDescriptor> {
        let mut sources = self.sources.clone();
        sources.sort_by_key(|s| s.priority);
        sources
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_retries() -> usize {
    3
}

fn default_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "frate/0.1".to_string()
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FusionConfig {
    pub family_weights: Option<BTreeMap<String, f64>>,
    #[serde(default = "default_underweight_discount")]
    pub underweight_discount: f64,
    #[serde(default = "default_overweight_premium")]
    pub overweight_premium: f64,
}

fn default_underweight_discount() -> f64 {
    0.10
}

fn default_overweight_premium() -> f64 {
    0.30
}

impl FusionConfig {
    pub fn family_weights(&self) -> FamilyWeights {
        match &self.family_weights {
            Some(weights) => FamilyWeights::new(weights.clone()),
            None => FamilyWeights::default(),
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            family_weights: None,
            underweight_discount: default_underweight_discount(),
            overweight_premium: default_overweight_premium(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub families: Vec<FamilyConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "frate", "frate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "frate", "frate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join("frate.db"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn family(&self, name: &str) -> Option<&FamilyConfig> {
        self.families
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionStrategy;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
families:
  - name: scfi
    sources:
      - name: "news"
        url: "http://example.com/news"
        priority: 2
        strategy:
          kind: text
          routes:
            - route: "Comprehensive Index"
              keywords: ["SCFI"]
      - name: "exchange"
        url: "http://example.com/scfi"
        strategy:
          kind: table
          selector: "table.scfi"
          keywords: ["SCFI"]
  - name: wci
    unit: per_feu
    route_weights:
      Rotterdam: 40.0
retry:
  max_retries: 1
fusion:
  family_weights:
    SCFI: 2.0
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.families.len(), 2);

        let scfi = config.family("SCFI").expect("scfi configured");
        assert_eq!(scfi.default_unit(), IndexUnit::PerTeu);
        assert_eq!(scfi.route_weights().weight_for("Europe (Base port)"), 20.0);

        let sources = scfi.ordered_sources();
        assert_eq!(sources[0].name, "exchange");
        assert_eq!(sources[0].locator, "http://example.com/scfi");
        assert!(matches!(sources[0].strategy, ExtractionStrategy::Table(_)));
        assert_eq!(sources[1].name, "news");
        assert!(matches!(sources[1].strategy, ExtractionStrategy::Text(_)));

        let wci = config.family("wci").unwrap();
        assert!(wci.sources.is_empty());
        assert_eq!(wci.route_weights().weight_for("Shanghai - Rotterdam"), 40.0);

        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.delay_ms, 2000);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fusion.family_weights().weight_of("scfi"), 2.0);
        assert_eq!(config.fusion.underweight_discount, 0.10);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_custom_data_path() {
        let yaml_str = r#"
families: []
data_path: "/tmp/frate-test"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/frate-test/frate.db")
        );
    }
}
