//! Builds the company table from the static catalog.

use std::collections::HashSet;

use anyhow::Result;
use chrono::NaiveDate;
use leadsheet_core::{Company, CompanySeed, HiringFlag};
use leadsheet_storage::{append_error_log, write_csv, StageLayout};
use tracing::{error, info, info_span, Instrument};

use crate::catalog::catalog;
use crate::{write_table, StageReport, COLLECTED_FILE, ERROR_LOG_FILE, RAW_SEEDS_FILE};

pub const STAGE: &str = "collect";

pub fn fallback_website(company_name: &str) -> String {
    format!(
        "https://www.{}.com",
        company_name.to_lowercase().replace(' ', "")
    )
}

pub fn company_profile_url(company_name: &str) -> String {
    let slug = company_name
        .to_lowercase()
        .replace(' ', "-")
        .replace('&', "and");
    format!("https://www.linkedin.com/company/{slug}")
}

/// Keeps the first seed for each exact company name.
pub fn dedup_seeds(seeds: &[CompanySeed]) -> Vec<CompanySeed> {
    let mut seen = HashSet::new();
    seeds
        .iter()
        .filter(|seed| seen.insert(seed.company_name))
        .cloned()
        .collect()
}

/// Deduplicates seeds and numbers the survivors from 1 in list order.
pub fn collect(seeds: &[CompanySeed], today: NaiveDate) -> Vec<Company> {
    dedup_seeds(seeds)
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let website = if seed.company_website.trim().is_empty() {
                fallback_website(seed.company_name)
            } else {
                seed.company_website.to_string()
            };
            Company {
                company_id: index as u32 + 1,
                company_name: seed.company_name.to_string(),
                industry: seed.industry,
                country: seed.country,
                company_size: None,
                annual_revenue: None,
                company_website: Some(website),
                linkedin_url: Some(company_profile_url(seed.company_name)),
                actively_hiring: HiringFlag::Unknown,
                hiring_devops: HiringFlag::Unknown,
                hiring_developers: HiringFlag::Unknown,
                devops_source: None,
                developers_source: None,
                data_source: seed.data_source.to_string(),
                last_verified: today,
            }
        })
        .collect()
}

pub async fn run(layout: &StageLayout, today: NaiveDate) -> Result<StageReport> {
    async {
        let seeds = catalog();
        let companies = collect(&seeds, today);
        let mut report = StageReport::new(STAGE, seeds.len(), companies.len());
        let error_log = layout.raw(ERROR_LOG_FILE);

        // Snapshot failures go to the error log and never abort the stage.
        match write_csv(&layout.raw(RAW_SEEDS_FILE), &seeds).await {
            Ok(stored) => report.record(&stored),
            Err(err) => log_write_failure(&error_log, &format!("{err:#}")).await,
        }
        match write_table(&layout.raw(COLLECTED_FILE), "Companies", &companies).await {
            Ok(stored) => stored.iter().for_each(|file| report.record(file)),
            Err(err) => log_write_failure(&error_log, &format!("{err:#}")).await,
        }

        info!(
            seeds = seeds.len(),
            companies = companies.len(),
            "collected company catalog"
        );
        Ok(report)
    }
    .instrument(info_span!("collector"))
    .await
}

async fn log_write_failure(error_log: &std::path::Path, message: &str) {
    error!(error = message, "collector snapshot write failed");
    if let Err(err) = append_error_log(error_log, message).await {
        error!(error = %err, "could not append to error log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadsheet_core::{Country, Industry};
    use leadsheet_storage::read_csv;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn seed(name: &'static str, website: &'static str) -> CompanySeed {
        CompanySeed {
            company_name: name,
            industry: Industry::Finance,
            country: Country::Australia,
            data_source: "Sample Data",
            company_website: website,
        }
    }

    #[test]
    fn ids_are_contiguous_after_dedup() {
        let companies = collect(&catalog(), today());
        assert_eq!(companies.len(), 74);
        for (index, company) in companies.iter().enumerate() {
            assert_eq!(company.company_id as usize, index + 1);
        }
        let names: HashSet<_> = companies.iter().map(|c| c.company_name.as_str()).collect();
        assert_eq!(names.len(), companies.len());
    }

    #[test]
    fn first_occurrence_wins() {
        let companies = collect(&catalog(), today());
        let westpac = companies
            .iter()
            .find(|c| c.company_name == "Westpac Banking Corporation")
            .unwrap();
        assert_eq!(westpac.data_source, "ASX");
        assert_eq!(westpac.country, Country::Australia);
    }

    #[test]
    fn dedup_is_idempotent() {
        let seeds = vec![seed("A", "a.com"), seed("B", "b.com"), seed("A", "a2.com")];
        let once = dedup_seeds(&seeds);
        assert_eq!(once.len(), 2);
        assert_eq!(once[0].company_website, "a.com");
        assert_eq!(dedup_seeds(&once), once);
        assert_eq!(collect(&once, today()), collect(&seeds, today()));
    }

    #[test]
    fn defaults_are_unknown_flags_and_derived_urls() {
        let companies = collect(&[seed("Bank & Trust Co", "")], today());
        let company = &companies[0];
        assert_eq!(company.hiring_devops, HiringFlag::Unknown);
        assert_eq!(company.actively_hiring, HiringFlag::Unknown);
        assert_eq!(company.last_verified, today());
        assert_eq!(
            company.company_website.as_deref(),
            Some("https://www.bank&trustco.com")
        );
        assert_eq!(
            company.linkedin_url.as_deref(),
            Some("https://www.linkedin.com/company/bank-and-trust-co")
        );
    }

    #[tokio::test]
    async fn run_writes_raw_and_processed_snapshots() {
        let dir = tempdir().unwrap();
        let layout = StageLayout::new(dir.path());
        layout.ensure().await.unwrap();

        let report = run(&layout, today()).await.unwrap();
        assert_eq!(report.rows_in, 85);
        assert_eq!(report.rows_out, 74);
        assert!(layout.raw(RAW_SEEDS_FILE).exists());
        assert!(layout.raw("companies_processed.xlsx").exists());
        assert!(!layout.raw("companies_raw.xlsx").exists());

        let back: Vec<Company> = read_csv(&layout.raw(COLLECTED_FILE), "collect").await.unwrap();
        assert_eq!(back, collect(&catalog(), today()));
    }
}
