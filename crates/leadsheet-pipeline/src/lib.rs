//! Four-stage lead sheet pipeline: collect, verify hiring, enrich contacts, consolidate.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use leadsheet_adapters::SourceProvider;
use leadsheet_storage::{
    write_csv, write_xlsx_snapshot, HttpClientConfig, HttpFetcher, Pacing, StageLayout,
    StoredFile,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub mod catalog;
pub mod collector;
pub mod consolidate;
pub mod contacts;
pub mod report;
pub mod status;
pub mod workbook;

pub const CRATE_NAME: &str = "leadsheet-pipeline";

pub const RAW_SEEDS_FILE: &str = "companies_raw.csv";
pub const COLLECTED_FILE: &str = "companies_processed.csv";
pub const VERIFIED_FILE: &str = "companies_hiring_verified.csv";
pub const TARGETS_FILE: &str = "top_hiring_companies.csv";
pub const CONTACTS_FILE: &str = "executives_contacts.csv";
pub const WORKBOOK_FILE: &str = "ANZ_Insurance_Finance_Companies.xlsx";
pub const BRIEF_FILE: &str = "pipeline_brief.md";
pub const ERROR_LOG_FILE: &str = "error_log.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Simulated,
    Live,
}

impl ProviderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderMode::Simulated => "simulated",
            ProviderMode::Live => "live",
        }
    }
}

impl FromStr for ProviderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "mock" => Ok(ProviderMode::Simulated),
            "live" => Ok(ProviderMode::Live),
            other => Err(format!("unknown provider `{other}` (expected simulated or live)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub provider: ProviderMode,
    pub seed: Option<u64>,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub pace_min_ms: u64,
    pub pace_max_ms: u64,
    pub contact_cap: usize,
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            provider: ProviderMode::Simulated,
            seed: None,
            user_agent: "leadsheet-bot/0.1".to_string(),
            http_timeout_secs: 10,
            pace_min_ms: 100,
            pace_max_ms: 300,
            contact_cap: 100,
            top_n: 10,
        }
    }
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("LEADSHEET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            provider: env_parsed("LEADSHEET_PROVIDER").unwrap_or(defaults.provider),
            seed: env_parsed("LEADSHEET_SEED"),
            user_agent: std::env::var("LEADSHEET_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout_secs: env_parsed("LEADSHEET_HTTP_TIMEOUT_SECS")
                .unwrap_or(defaults.http_timeout_secs),
            pace_min_ms: env_parsed("LEADSHEET_PACE_MIN_MS").unwrap_or(defaults.pace_min_ms),
            pace_max_ms: env_parsed("LEADSHEET_PACE_MAX_MS").unwrap_or(defaults.pace_max_ms),
            contact_cap: env_parsed("LEADSHEET_CONTACT_CAP").unwrap_or(defaults.contact_cap),
            top_n: env_parsed("LEADSHEET_TOP_N").unwrap_or(defaults.top_n),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::between_millis(self.pace_min_ms, self.pace_max_ms)
    }

    pub fn build_provider(&self) -> Result<SourceProvider> {
        match self.provider {
            ProviderMode::Simulated => Ok(SourceProvider::simulated(self.seed)),
            ProviderMode::Live => {
                let fetcher = HttpFetcher::new(HttpClientConfig {
                    timeout: Duration::from_secs(self.http_timeout_secs),
                    user_agent: Some(self.user_agent.clone()),
                    pacing: self.pacing(),
                    ..Default::default()
                })?;
                Ok(SourceProvider::live(Arc::new(fetcher)))
            }
        }
    }
}

/// What one stage read and wrote.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
    pub outputs: Vec<String>,
}

impl StageReport {
    pub(crate) fn new(stage: &'static str, rows_in: usize, rows_out: usize) -> Self {
        Self {
            stage,
            rows_in,
            rows_out,
            outputs: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, stored: &StoredFile) {
        self.outputs.push(stored.path.display().to_string());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub provider: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
}

/// Identity of the run that produced the final artifacts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub provider: &'static str,
    pub started_at: DateTime<Utc>,
}

/// Writes a stage table as CSV plus a plain XLSX snapshot next to it.
pub(crate) async fn write_table<T: Serialize>(
    csv_path: &Path,
    sheet_name: &str,
    rows: &[T],
) -> Result<Vec<StoredFile>> {
    let csv = write_csv(csv_path, rows)
        .await
        .with_context(|| format!("writing {}", csv_path.display()))?;
    let xlsx_path = csv_path.with_extension("xlsx");
    let xlsx = write_xlsx_snapshot(&xlsx_path, sheet_name, rows)
        .await
        .with_context(|| format!("writing {}", xlsx_path.display()))?;
    Ok(vec![csv, xlsx])
}

pub struct LeadPipeline {
    config: PipelineConfig,
    layout: StageLayout,
    provider: SourceProvider,
    pacing: Pacing,
    today: NaiveDate,
    run: RunContext,
}

impl LeadPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let provider = config.build_provider()?;
        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: PipelineConfig, provider: SourceProvider) -> Self {
        let layout = StageLayout::new(config.data_dir.clone());
        let pacing = config.pacing();
        let run = RunContext {
            run_id: Uuid::new_v4(),
            provider: provider.label,
            started_at: Utc::now(),
        };
        Self {
            config,
            layout,
            provider,
            pacing,
            today: Local::now().date_naive(),
            run,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    pub async fn collect(&self) -> Result<StageReport> {
        self.layout.ensure().await?;
        collector::run(&self.layout, self.today).await
    }

    pub async fn verify(&self) -> Result<StageReport> {
        self.layout.ensure().await?;
        status::run(&self.layout, &self.provider, self.pacing).await
    }

    pub async fn enrich(&self) -> Result<StageReport> {
        self.layout.ensure().await?;
        contacts::run(
            &self.layout,
            &self.provider,
            self.pacing,
            self.config.contact_cap,
        )
        .await
    }

    pub async fn consolidate(&self) -> Result<StageReport> {
        self.layout.ensure().await?;
        consolidate::run(&self.layout, &self.run, self.config.top_n).await
    }

    pub async fn run_all(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let stages = vec![
            self.collect().await?,
            self.verify().await?,
            self.enrich().await?,
            self.consolidate().await?,
        ];
        let summary = RunSummary {
            run_id: self.run.run_id,
            provider: self.run.provider,
            started_at,
            finished_at: Utc::now(),
            stages,
        };
        info!(run_id = %summary.run_id, provider = summary.provider, "pipeline run complete");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_mode_parses_case_insensitively() {
        assert_eq!("Live".parse::<ProviderMode>(), Ok(ProviderMode::Live));
        assert_eq!("simulated".parse::<ProviderMode>(), Ok(ProviderMode::Simulated));
        assert!("scrape".parse::<ProviderMode>().is_err());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.provider, ProviderMode::Simulated);
        assert_eq!(config.contact_cap, 100);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.pacing(), Pacing::between_millis(100, 300));
    }

    #[test]
    fn simulated_provider_builds_without_network() {
        let config = PipelineConfig {
            seed: Some(7),
            ..PipelineConfig::default()
        };
        let provider = config.build_provider().unwrap();
        assert_eq!(provider.label, "simulated");
    }
}
