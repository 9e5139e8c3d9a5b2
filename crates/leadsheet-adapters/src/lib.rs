//! Source provider contracts for hiring probes, executive discovery and contact lookup.

use std::sync::Arc;

use async_trait::async_trait;
use leadsheet_core::{Candidate, Company, Country, ProbeOutcome, UNKNOWN_NAME};
use leadsheet_storage::{FetchError, HttpFetcher};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use thiserror::Error;

pub mod live;
pub mod simulated;

pub const CRATE_NAME: &str = "leadsheet-adapters";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Message(String),
}

/// One place a company's open roles can be checked.
#[async_trait]
pub trait HiringSource: Send + Sync {
    fn source_id(&self) -> &'static str;

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError>;
}

/// Surfaces technology executives for a company.
#[async_trait]
pub trait ExecutiveFinder: Send + Sync {
    fn source_id(&self) -> &'static str;

    async fn find(&self, company: &Company) -> Result<Vec<Candidate>, SourceError>;
}

#[async_trait]
pub trait ContactLookup: Send + Sync {
    async fn email_pattern(&self, domain: &str) -> Result<EmailPattern, SourceError>;

    async fn verify_email(&self, email: &str) -> Result<bool, SourceError>;

    async fn find_phone(
        &self,
        executive_name: &str,
        company: &Company,
    ) -> Result<Option<String>, SourceError>;
}

/// Every external source the pipeline consults, bundled so stages never branch on mode.
pub struct SourceProvider {
    pub label: &'static str,
    pub careers_page: Box<dyn HiringSource>,
    pub social_jobs: Box<dyn HiringSource>,
    pub job_board: Box<dyn HiringSource>,
    pub profile_finder: Box<dyn ExecutiveFinder>,
    pub site_finder: Box<dyn ExecutiveFinder>,
    pub contacts: Box<dyn ContactLookup>,
}

impl SourceProvider {
    /// Seeded random stand-ins. The same seed replays the same run.
    pub fn simulated(seed: Option<u64>) -> Self {
        let rng = simulated::shared_rng(seed);
        Self {
            label: "simulated",
            careers_page: Box::new(simulated::SimulatedCareersPage::new(rng.clone())),
            social_jobs: Box::new(simulated::SimulatedSocialJobs::new(rng.clone())),
            job_board: Box::new(simulated::SimulatedJobBoard::new(rng.clone())),
            profile_finder: Box::new(simulated::SimulatedProfileFinder::new(rng.clone())),
            site_finder: Box::new(simulated::SimulatedSiteFinder::new(rng.clone())),
            contacts: Box::new(simulated::SimulatedContactLookup::new(rng)),
        }
    }

    /// Network-backed sources. Page layouts change often; results are best effort.
    pub fn live(fetcher: Arc<HttpFetcher>) -> Self {
        Self {
            label: "live",
            careers_page: Box::new(live::LiveCareersPage::new(fetcher.clone())),
            social_jobs: Box::new(live::LiveSocialJobs::new(fetcher.clone())),
            job_board: Box::new(live::LiveJobBoard::new(fetcher.clone())),
            profile_finder: Box::new(live::LiveProfileFinder::new(fetcher.clone())),
            site_finder: Box::new(live::LiveSiteFinder::new(fetcher)),
            contacts: Box::new(live::LiveContactLookup::new()),
        }
    }

    /// Hiring sources in the order they are consulted.
    pub fn hiring_sources(&self) -> [&dyn HiringSource; 3] {
        [
            self.careers_page.as_ref(),
            self.social_jobs.as_ref(),
            self.job_board.as_ref(),
        ]
    }
}

/// Local-part shapes a company might use for staff addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailPattern {
    FirstDotLast,
    FirstLast,
    FirstUnderscoreLast,
    InitialLast,
    FirstDotInitial,
    InitialDotLast,
}

impl EmailPattern {
    pub const ALL: [EmailPattern; 6] = [
        EmailPattern::FirstDotLast,
        EmailPattern::FirstLast,
        EmailPattern::FirstUnderscoreLast,
        EmailPattern::InitialLast,
        EmailPattern::FirstDotInitial,
        EmailPattern::InitialDotLast,
    ];

    pub fn template(self) -> &'static str {
        match self {
            EmailPattern::FirstDotLast => "first.last",
            EmailPattern::FirstLast => "firstlast",
            EmailPattern::FirstUnderscoreLast => "first_last",
            EmailPattern::InitialLast => "flast",
            EmailPattern::FirstDotInitial => "first.l",
            EmailPattern::InitialDotLast => "f.last",
        }
    }

    pub fn render(self, first: &str, last: &str, domain: &str) -> String {
        let first = first.to_lowercase();
        let last = last.to_lowercase();
        let f: String = first.chars().take(1).collect();
        let l: String = last.chars().take(1).collect();
        let local = match self {
            EmailPattern::FirstDotLast => format!("{first}.{last}"),
            EmailPattern::FirstLast => format!("{first}{last}"),
            EmailPattern::FirstUnderscoreLast => format!("{first}_{last}"),
            EmailPattern::InitialLast => format!("{f}{last}"),
            EmailPattern::FirstDotInitial => format!("{first}.{l}"),
            EmailPattern::InitialDotLast => format!("{f}.{last}"),
        };
        format!("{local}@{domain}")
    }
}

static DEVOPS_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(devops|dev ops|site reliability|sre|platform engineer|infrastructure engineer)\b")
        .expect("valid regex")
});

static DEVELOPER_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(software developer|software engineer|programmer|web developer|frontend|backend|full stack)\b",
    )
    .expect("valid regex")
});

static PERSON_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]+ [A-Z][a-z]+)").expect("valid regex"));

/// Reports which role families a block of page text mentions.
pub fn detect_roles(text: &str) -> (bool, bool) {
    (DEVOPS_TERMS.is_match(text), DEVELOPER_TERMS.is_match(text))
}

/// Visible text of an HTML document, whitespace-joined.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn first_person_name(text: &str) -> Option<String> {
    PERSON_NAME
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Bare host of a website URL without scheme, path or a leading `www.`.
pub fn extract_domain(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// First and last token of a person's name. `Unknown` and single-token names yield nothing.
pub fn split_name(name: &str) -> Option<(String, String)> {
    if name.trim() == UNKNOWN_NAME {
        return None;
    }
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    Some((tokens[0].to_string(), tokens[tokens.len() - 1].to_string()))
}

pub(crate) fn with_scheme(website: &str) -> String {
    let website = website.trim().trim_end_matches('/');
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    }
}

pub fn careers_page_url(website: &str) -> String {
    format!("{}/careers", website.trim_end_matches('/'))
}

pub fn leadership_page_url(website: &str) -> String {
    format!("{}/about/leadership", website.trim_end_matches('/'))
}

pub fn social_jobs_url(company_name: &str, role_query: Option<&str>) -> String {
    let mut keywords = company_name.replace(' ', "%20");
    if let Some(role) = role_query {
        keywords.push_str("%20");
        keywords.push_str(&role.replace(' ', "%20"));
    }
    format!("https://www.linkedin.com/jobs/search/?keywords={keywords}")
}

pub fn job_board_url(company_name: &str, country: Country) -> String {
    let domain = match country {
        Country::Australia => "seek.com.au",
        Country::NewZealand => "seek.co.nz",
    };
    let query = company_name.replace(' ', "-").to_lowercase();
    format!("https://www.{domain}/jobs?keywords={query}")
}
