//! Hiring status checker: asks each hiring source in turn until both role flags are settled.

use anyhow::Result;
use leadsheet_adapters::SourceProvider;
use leadsheet_core::{Company, HiringFlag, ProbeOutcome};
use leadsheet_storage::{read_csv, Pacing, StageLayout};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{write_table, StageReport, COLLECTED_FILE, VERIFIED_FILE};

pub const STAGE: &str = "verify";

/// Role flags as they accumulate across probes. A flag only ever moves to `Yes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiringEvidence {
    pub devops: HiringFlag,
    pub developers: HiringFlag,
    pub devops_source: Option<String>,
    pub developers_source: Option<String>,
}

impl HiringEvidence {
    pub fn from_company(company: &Company) -> Self {
        Self {
            devops: company.hiring_devops,
            developers: company.hiring_developers,
            devops_source: company.devops_source.clone(),
            developers_source: company.developers_source.clone(),
        }
    }

    pub fn complete(&self) -> bool {
        self.devops.is_yes() && self.developers.is_yes()
    }

    pub fn absorb(&mut self, outcome: &ProbeOutcome) {
        if outcome.devops && !self.devops.is_yes() {
            self.devops = HiringFlag::Yes;
            self.devops_source = outcome.source_url.clone();
        }
        if outcome.developers && !self.developers.is_yes() {
            self.developers = HiringFlag::Yes;
            self.developers_source = outcome.source_url.clone();
        }
    }

    /// Applies the settled flags to a fresh copy of `company`.
    pub fn settle(self, company: &Company) -> Company {
        let devops = self.devops.settle();
        let developers = self.developers.settle();
        Company {
            hiring_devops: devops,
            hiring_developers: developers,
            actively_hiring: HiringFlag::from_bool(devops.is_yes() || developers.is_yes()),
            devops_source: self.devops_source,
            developers_source: self.developers_source,
            ..company.clone()
        }
    }
}

pub async fn verify_company(provider: &SourceProvider, company: &Company) -> Company {
    let mut evidence = HiringEvidence::from_company(company);
    for (position, source) in provider.hiring_sources().into_iter().enumerate() {
        if evidence.complete() {
            break;
        }
        // The careers page can only be probed when a website is known.
        if position == 0 && company.company_website.is_none() {
            continue;
        }
        match source.probe(company).await {
            Ok(outcome) => {
                debug!(
                    company = %company.company_name,
                    source = source.source_id(),
                    devops = outcome.devops,
                    developers = outcome.developers,
                    "probe finished"
                );
                evidence.absorb(&outcome);
            }
            Err(err) => warn!(
                company = %company.company_name,
                source = source.source_id(),
                error = %err,
                "hiring probe failed; treating as no signal"
            ),
        }
    }
    evidence.settle(company)
}

pub async fn run(
    layout: &StageLayout,
    provider: &SourceProvider,
    pacing: Pacing,
) -> Result<StageReport> {
    async {
        let companies: Vec<Company> =
            read_csv(&layout.raw(COLLECTED_FILE), "leadsheet collect").await?;

        let mut verified = Vec::with_capacity(companies.len());
        for company in &companies {
            verified.push(verify_company(provider, company).await);
            pacing.pause().await;
        }

        let mut report = StageReport::new(STAGE, companies.len(), verified.len());
        for stored in write_table(&layout.processed(VERIFIED_FILE), "Hiring Verified", &verified).await? {
            report.record(&stored);
        }

        info!(
            checked = verified.len(),
            actively_hiring = verified.iter().filter(|c| c.actively_hiring.is_yes()).count(),
            devops = verified.iter().filter(|c| c.hiring_devops.is_yes()).count(),
            developers = verified.iter().filter(|c| c.hiring_developers.is_yes()).count(),
            "hiring verification complete"
        );
        Ok(report)
    }
    .instrument(info_span!("status_checker"))
    .await
}
