//! Network-backed sources. These scrape public pages whose markup is not under
//! our control, so every miss is reported as "no signal" rather than an error.

use std::sync::Arc;

use async_trait::async_trait;
use leadsheet_core::{Candidate, Company, ProbeOutcome, UNKNOWN_NAME};
use leadsheet_storage::HttpFetcher;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

use crate::{
    detect_roles, first_person_name, job_board_url, page_text, social_jobs_url, with_scheme,
    ContactLookup, EmailPattern, ExecutiveFinder, HiringSource, SourceError,
};

const CAREERS_PATHS: [&str; 13] = [
    "/careers",
    "/jobs",
    "/join-us",
    "/work-with-us",
    "/about/careers",
    "/about-us/careers",
    "/en/careers",
    "/about/jobs",
    "/current-vacancies",
    "/vacancies",
    "/employment",
    "/work-for-us",
    "/careers/jobs",
];

const LEADERSHIP_PATHS: [&str; 17] = [
    "/about/leadership",
    "/about/management",
    "/about/team",
    "/about-us/leadership",
    "/about-us/management",
    "/about-us/team",
    "/company/leadership",
    "/company/management",
    "/company/team",
    "/leadership",
    "/management",
    "/team",
    "/about",
    "/about-us",
    "/who-we-are",
    "/our-team",
    "/our-people",
];

const JOB_LINK_WORDS: [&str; 5] = ["job", "career", "position", "vacancy", "role"];
const LEADERSHIP_WORDS: [&str; 5] = ["leadership", "management", "executive", "team", "board"];
const JOB_LINKS_PER_PAGE: usize = 3;
const DEFAULT_TITLE: &str = "Technology Executive";
const PROFILE_SOURCE: &str = "LinkedIn via Google";

static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(https://\w+\.linkedin\.com/in/[^&]+)").expect("valid regex")
});

static SEARCH_RESULT_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Chief Technology Officer|Chief Information Officer|Chief Digital Officer|CTO|CIO|CDO|(?:VP|Head|Director) of (?:Technology|Engineering|IT)",
    )
    .expect("valid regex")
});

static SITE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(chief technology officer|cto|chief information officer|cio|chief digital officer|cdo|(?:vp|head|director) of (?:technology|engineering|it))\b",
    )
    .expect("valid regex")
});

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Message(e.to_string()))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Resolves an href against the page it was found on.
fn resolve_link(page_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let scheme_end = page_url.find("://").map(|i| i + 3).unwrap_or(0);
    let origin_end = page_url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i)
        .unwrap_or(page_url.len());
    if href.starts_with('/') {
        format!("{}{}", &page_url[..origin_end], href)
    } else {
        format!("{}/{}", page_url.trim_end_matches('/'), href)
    }
}

fn job_links(html: &str, page_url: &str) -> Result<Vec<String>, SourceError> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;
    Ok(document
        .select(&anchors)
        .filter(|a| {
            let text = a.text().collect::<String>().to_lowercase();
            JOB_LINK_WORDS.iter().any(|word| text.contains(word))
        })
        .filter_map(|a| a.value().attr("href"))
        .map(|href| resolve_link(page_url, href))
        .take(JOB_LINKS_PER_PAGE)
        .collect())
}

fn merge(outcome: &mut ProbeOutcome, text: &str, url: &str) {
    let (devops, developers) = detect_roles(text);
    if devops && !outcome.devops {
        outcome.devops = true;
        outcome.source_url = Some(url.to_string());
    }
    if developers && !outcome.developers {
        outcome.developers = true;
        outcome.source_url = Some(url.to_string());
    }
}

/// Fetches a page, treating any transport or status failure as "no page".
async fn fetch_page(fetcher: &HttpFetcher, url: &str) -> Option<String> {
    match fetcher.fetch_text(url).await {
        Ok(page) => Some(page.body),
        Err(err) => {
            debug!(url, error = %err, "page unavailable");
            None
        }
    }
}

pub struct LiveCareersPage {
    fetcher: Arc<HttpFetcher>,
}

impl LiveCareersPage {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl HiringSource for LiveCareersPage {
    fn source_id(&self) -> &'static str {
        "careers-page"
    }

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError> {
        let Some(website) = company.company_website.as_deref() else {
            return Ok(ProbeOutcome::nothing());
        };
        let base = with_scheme(website);
        let mut outcome = ProbeOutcome::nothing();

        for path in CAREERS_PATHS {
            let url = format!("{base}{path}");
            let Some(html) = fetch_page(&self.fetcher, &url).await else {
                continue;
            };
            merge(&mut outcome, &page_text(&html), &url);
            if outcome.devops && outcome.developers {
                return Ok(outcome);
            }

            for link in job_links(&html, &url)? {
                if let Some(job_html) = fetch_page(&self.fetcher, &link).await {
                    merge(&mut outcome, &page_text(&job_html), &link);
                }
            }
        }
        Ok(outcome)
    }
}

pub struct LiveSocialJobs {
    fetcher: Arc<HttpFetcher>,
}

impl LiveSocialJobs {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl HiringSource for LiveSocialJobs {
    fn source_id(&self) -> &'static str {
        "social-jobs"
    }

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError> {
        let url = social_jobs_url(&company.company_name, None);
        let page = self.fetcher.fetch_text(&url).await?;
        let mut outcome = ProbeOutcome::nothing();
        merge(&mut outcome, &page_text(&page.body), &url);
        Ok(outcome)
    }
}

pub struct LiveJobBoard {
    fetcher: Arc<HttpFetcher>,
}

impl LiveJobBoard {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl HiringSource for LiveJobBoard {
    fn source_id(&self) -> &'static str {
        "job-board"
    }

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError> {
        let url = job_board_url(&company.company_name, company.country);
        let page = self.fetcher.fetch_text(&url).await?;
        let mut outcome = ProbeOutcome::nothing();
        merge(&mut outcome, &page_text(&page.body), &url);
        Ok(outcome)
    }
}

/// Finds executive profiles through a web search scoped to the professional network.
pub struct LiveProfileFinder {
    fetcher: Arc<HttpFetcher>,
}

impl LiveProfileFinder {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }

    fn search_url(company_name: &str) -> String {
        let company = company_name.replace(' ', "%20");
        let titles = "\"CTO\"%20OR%20\"Chief%20Technology%20Officer\"%20OR%20\"CIO\"%20OR%20\"Chief%20Information%20Officer\"%20OR%20\"VP%20Engineering\"%20OR%20\"Head%20of%20Technology\"";
        format!("https://www.google.com/search?q=site%3Alinkedin.com%2Fin%20{company}%20({titles})")
    }
}

pub(crate) fn candidates_from_search_results(html: &str) -> Result<Vec<Candidate>, SourceError> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;
    let mut found = Vec::new();
    for anchor in document.select(&anchors) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if !href.contains("linkedin.com/in/") || href.contains("/pub/dir/") {
            continue;
        }
        let Some(profile) = PROFILE_URL.captures(href).and_then(|c| c.get(1)) else {
            continue;
        };
        let text = anchor.text().collect::<String>();
        let name = first_person_name(&text).unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let title = SEARCH_RESULT_TITLE
            .find(&text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        found.push(Candidate {
            name,
            title,
            linkedin_url: Some(profile.as_str().to_string()),
            source: PROFILE_SOURCE.to_string(),
        });
    }
    Ok(found)
}

#[async_trait]
impl ExecutiveFinder for LiveProfileFinder {
    fn source_id(&self) -> &'static str {
        "profile-search"
    }

    async fn find(&self, company: &Company) -> Result<Vec<Candidate>, SourceError> {
        let page = self
            .fetcher
            .fetch_text(&Self::search_url(&company.company_name))
            .await?;
        candidates_from_search_results(&page.body)
    }
}

/// Crawls common leadership paths and stops at the first page naming a technology executive.
pub struct LiveSiteFinder {
    fetcher: Arc<HttpFetcher>,
}

impl LiveSiteFinder {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

pub(crate) fn candidates_from_leadership_page(
    html: &str,
    page_url: &str,
) -> Result<Vec<Candidate>, SourceError> {
    let lowered = page_text(html).to_lowercase();
    if !LEADERSHIP_WORDS.iter().any(|w| lowered.contains(w)) {
        return Ok(Vec::new());
    }
    let document = Html::parse_document(html);
    let blocks = selector("h1, h2, h3, h4, h5, h6, p, div")?;
    let mut found = Vec::new();
    for element in document.select(&blocks) {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let Some(title) = SITE_TITLE.find(&text) else {
            continue;
        };
        let Some(name) = first_person_name(&text) else {
            continue;
        };
        found.push(Candidate {
            name,
            title: title_case(title.as_str()),
            linkedin_url: None,
            source: page_url.to_string(),
        });
    }
    Ok(found)
}

#[async_trait]
impl ExecutiveFinder for LiveSiteFinder {
    fn source_id(&self) -> &'static str {
        "company-site"
    }

    async fn find(&self, company: &Company) -> Result<Vec<Candidate>, SourceError> {
        let Some(website) = company.company_website.as_deref() else {
            return Ok(Vec::new());
        };
        let base = with_scheme(website);
        for path in LEADERSHIP_PATHS {
            let url = format!("{base}{path}");
            let Some(html) = fetch_page(&self.fetcher, &url).await else {
                continue;
            };
            let found = candidates_from_leadership_page(&html, &url)?;
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}

/// Assumes `first.last`, treats any MX record for the domain as verified, and
/// has no phone source.
pub struct LiveContactLookup {
    resolver: TokioAsyncResolver,
}

impl LiveContactLookup {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for LiveContactLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Domain part of an address, `None` when there is no usable domain.
pub(crate) fn email_domain(email: &str) -> Option<&str> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.trim_end_matches('.');
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return None;
    }
    Some(domain)
}

#[async_trait]
impl ContactLookup for LiveContactLookup {
    async fn email_pattern(&self, _domain: &str) -> Result<EmailPattern, SourceError> {
        Ok(EmailPattern::FirstDotLast)
    }

    async fn verify_email(&self, email: &str) -> Result<bool, SourceError> {
        let Some(domain) = email_domain(email) else {
            return Ok(false);
        };
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().next().is_some()),
            Err(err) => {
                debug!(domain, error = %err, "no MX records for mail domain");
                Ok(false)
            }
        }
    }

    async fn find_phone(
        &self,
        _executive_name: &str,
        _company: &Company,
    ) -> Result<Option<String>, SourceError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_resolve_against_origin_or_page() {
        assert_eq!(
            resolve_link("https://www.amp.com.au/careers", "/jobs/123"),
            "https://www.amp.com.au/jobs/123"
        );
        assert_eq!(
            resolve_link("https://www.amp.com.au/careers", "openings"),
            "https://www.amp.com.au/careers/openings"
        );
        assert_eq!(
            resolve_link("https://www.amp.com.au/careers", "https://jobs.example.com/x"),
            "https://jobs.example.com/x"
        );
    }

    #[test]
    fn job_links_are_capped_and_filtered_by_text() {
        let html = r#"<a href="/a">Open roles</a><a href="/b">Contact</a>
            <a href="/c">Careers at AMP</a><a href="/d">Job search</a><a href="/e">Vacancy list</a>"#;
        let links = job_links(html, "https://www.amp.com.au/careers").unwrap();
        assert_eq!(
            links,
            vec![
                "https://www.amp.com.au/a",
                "https://www.amp.com.au/c",
                "https://www.amp.com.au/d",
            ]
        );
    }

    #[test]
    fn merge_never_downgrades_and_cites_latest_hit() {
        let mut outcome = ProbeOutcome::nothing();
        merge(&mut outcome, "Site Reliability Engineer", "https://a");
        merge(&mut outcome, "nothing relevant", "https://b");
        merge(&mut outcome, "Backend developer", "https://c");
        assert!(outcome.devops && outcome.developers);
        assert_eq!(outcome.source_url.as_deref(), Some("https://c"));
    }

    #[test]
    fn search_results_yield_profile_candidates() {
        let html = r#"<html><body>
            <a href="/url?q=https://au.linkedin.com/in/karen-white-1&sa=U">Karen White - CTO - Acme</a>
            <a href="https://www.linkedin.com/pub/dir/karen">Directory</a>
            <a href="https://nz.linkedin.com/in/someone">profile</a>
        </body></html>"#;
        let found = candidates_from_search_results(html).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "Karen White");
        assert_eq!(found[0].title, "CTO");
        assert_eq!(
            found[0].linkedin_url.as_deref(),
            Some("https://au.linkedin.com/in/karen-white-1")
        );
        assert_eq!(found[1].name, UNKNOWN_NAME);
        assert_eq!(found[1].title, DEFAULT_TITLE);
    }

    #[test]
    fn leadership_page_titles_are_title_cased() {
        let html = r#"<html><body><h1>Our leadership team</h1>
            <p>Linda Moore, chief information officer</p>
            <p>Directors of the board</p></body></html>"#;
        let found = candidates_from_leadership_page(html, "https://x.com/leadership").unwrap();
        assert!(found.iter().any(|c| c.name == "Linda Moore"
            && c.title == "Chief Information Officer"
            && c.source == "https://x.com/leadership"));
    }

    #[test]
    fn pages_without_leadership_words_are_ignored() {
        let html = "<html><body><p>Linda Moore, CTO</p></body></html>";
        assert!(candidates_from_leadership_page(html, "https://x.com/about")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn mail_domain_needs_a_local_part_and_a_dotted_host() {
        assert_eq!(email_domain("linda.moore@amp.com.au"), Some("amp.com.au"));
        assert_eq!(email_domain("linda.moore@amp.com.au."), Some("amp.com.au"));
        assert_eq!(email_domain("linda.moore"), None);
        assert_eq!(email_domain("@amp.com.au"), None);
        assert_eq!(email_domain("linda@localhost"), None);
    }

    #[tokio::test]
    async fn addresses_without_a_domain_are_never_verified() {
        let lookup = LiveContactLookup::new();
        assert!(!lookup.verify_email("linda.moore").await.unwrap());
        assert!(!lookup.verify_email("linda.moore@").await.unwrap());
    }
}
