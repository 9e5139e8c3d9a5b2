//! Contact finder: picks hiring targets and derives executive contacts for each.

use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::Result;
use leadsheet_adapters::{extract_domain, split_name, EmailPattern, ExecutiveFinder, SourceProvider};
use leadsheet_core::{Candidate, Company, Contact, VerificationStatus};
use leadsheet_storage::{read_csv, Pacing, StageLayout};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{write_table, StageReport, CONTACTS_FILE, TARGETS_FILE, VERIFIED_FILE};

pub const STAGE: &str = "enrich";

fn size_then_revenue(a: &Company, b: &Company) -> Ordering {
    fn descending<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
    descending(a.company_size, b.company_size)
        .then_with(|| descending(a.annual_revenue, b.annual_revenue))
}

/// Companies worth contacting. Order is kept below the cap. At or above it the
/// largest companies come first and the rest are trimmed.
pub fn select_targets(companies: &[Company], cap: usize) -> Vec<Company> {
    let mut targets: Vec<Company> = companies
        .iter()
        .filter(|c| c.actively_hiring.is_yes() && c.hiring_any_role())
        .cloned()
        .collect();
    if targets.len() >= cap {
        targets.sort_by(size_then_revenue);
        targets.truncate(cap);
    }
    targets
}

/// Concatenates candidate lists, dropping repeated names case-insensitively.
pub fn merge_candidates(lists: impl IntoIterator<Item = Vec<Candidate>>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|candidate| seen.insert(candidate.name.trim().to_lowercase()))
        .collect()
}

async fn ask_finder(finder: &dyn ExecutiveFinder, company: &Company) -> Vec<Candidate> {
    match finder.find(company).await {
        Ok(found) => found,
        Err(err) => {
            warn!(
                company = %company.company_name,
                source = finder.source_id(),
                error = %err,
                "executive lookup failed; continuing without it"
            );
            Vec::new()
        }
    }
}

pub async fn candidates_for(provider: &SourceProvider, company: &Company) -> Vec<Candidate> {
    let mut lists = vec![ask_finder(provider.profile_finder.as_ref(), company).await];
    if company.company_website.is_some() {
        lists.push(ask_finder(provider.site_finder.as_ref(), company).await);
    }
    let merged = merge_candidates(lists);
    if merged.is_empty() {
        vec![Candidate::placeholder()]
    } else {
        merged
    }
}

async fn email_pattern(provider: &SourceProvider, domain: &str) -> Option<EmailPattern> {
    match provider.contacts.email_pattern(domain).await {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            warn!(domain, error = %err, "email pattern lookup failed");
            None
        }
    }
}

pub async fn contacts_for(provider: &SourceProvider, company: &Company) -> Vec<Contact> {
    let candidates = candidates_for(provider, company).await;
    let domain = company.company_website.as_deref().and_then(extract_domain);
    let pattern = match &domain {
        Some(domain) => email_pattern(provider, domain).await,
        None => None,
    };

    let mut contacts = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some((first, last)) = split_name(&candidate.name) else {
            debug!(company = %company.company_name, name = %candidate.name, "skipping unnamed candidate");
            continue;
        };

        let email = match (pattern, &domain) {
            (Some(pattern), Some(domain)) => Some(pattern.render(&first, &last, domain)),
            _ => None,
        };
        let verification_status = match &email {
            Some(address) => match provider.contacts.verify_email(address).await {
                Ok(true) => VerificationStatus::DomainVerified,
                Ok(false) => VerificationStatus::NotVerified,
                Err(err) => {
                    warn!(email = %address, error = %err, "email verification failed");
                    VerificationStatus::NotVerified
                }
            },
            None => VerificationStatus::NotVerified,
        };
        let phone = provider
            .contacts
            .find_phone(&candidate.name, company)
            .await
            .unwrap_or_else(|err| {
                warn!(name = %candidate.name, error = %err, "phone lookup failed");
                None
            });

        contacts.push(Contact {
            company_id: company.company_id,
            executive_name: candidate.name,
            executive_title: candidate.title,
            linkedin_url: candidate.linkedin_url,
            email,
            phone,
            source: candidate.source,
            verification_status,
        });
    }
    contacts
}

pub async fn run(
    layout: &StageLayout,
    provider: &SourceProvider,
    pacing: Pacing,
    cap: usize,
) -> Result<StageReport> {
    async {
        let companies: Vec<Company> =
            read_csv(&layout.processed(VERIFIED_FILE), "leadsheet verify").await?;
        let targets = select_targets(&companies, cap);
        info!(candidates = companies.len(), targets = targets.len(), "selected hiring targets");

        let mut contacts = Vec::new();
        for company in &targets {
            contacts.extend(contacts_for(provider, company).await);
            pacing.pause().await;
        }

        let mut report = StageReport::new(STAGE, companies.len(), contacts.len());
        for stored in write_table(&layout.processed(TARGETS_FILE), "Top Hiring", &targets).await? {
            report.record(&stored);
        }
        for stored in write_table(&layout.processed(CONTACTS_FILE), "Executives", &contacts).await? {
            report.record(&stored);
        }

        info!(
            targets = targets.len(),
            contacts = contacts.len(),
            with_email = contacts.iter().filter(|c| c.email.is_some()).count(),
            with_phone = contacts.iter().filter(|c| c.phone.is_some()).count(),
            "contact enrichment complete"
        );
        Ok(report)
    }
    .instrument(info_span!("contact_finder"))
    .await
}
