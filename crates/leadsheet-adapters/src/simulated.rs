//! Seeded random stand-ins for every source.
//!
//! All simulated sources draw from one shared generator, so a fixed seed
//! replays the whole run as long as companies are visited in the same order.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use leadsheet_core::{Candidate, Company, ProbeOutcome};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{
    careers_page_url, detect_roles, job_board_url, leadership_page_url, page_text,
    social_jobs_url, ContactLookup, EmailPattern, ExecutiveFinder, HiringSource, SourceError,
};

pub const MOCK_SOURCE: &str = "Mock Data";

const FIRST_NAMES: [&str; 20] = [
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph", "Thomas",
    "Charles", "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Barbara", "Susan",
    "Jessica", "Sarah", "Karen",
];

const LAST_NAMES: [&str; 20] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Miller", "Davis", "Garcia", "Rodriguez",
    "Wilson", "Martinez", "Anderson", "Taylor", "Thomas", "Hernandez", "Moore", "Martin",
    "Jackson", "Thompson", "White",
];

const TECH_TITLES: [&str; 12] = [
    "Chief Technology Officer",
    "CTO",
    "Chief Information Officer",
    "CIO",
    "Chief Digital Officer",
    "CDO",
    "VP of Engineering",
    "VP of Technology",
    "Head of Technology",
    "Head of Engineering",
    "Director of IT",
    "Director of Technology",
];

pub type SharedRng = Arc<Mutex<StdRng>>;

pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Arc::new(Mutex::new(rng))
}

fn with_rng<T>(rng: &SharedRng, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

fn coin_pair(rng: &SharedRng) -> (bool, bool) {
    with_rng(rng, |r| (r.gen_bool(0.5), r.gen_bool(0.5)))
}

/// Careers page markup with one posting per advertised role.
pub fn mock_careers_html(company_name: &str, devops: bool, developers: bool) -> String {
    let mut html = format!(
        "<html><head><title>{company_name} Careers</title></head><body>\
         <h1>{company_name} Career Opportunities</h1><div class=\"job-listings\">"
    );
    if devops {
        html.push_str(
            "<div class=\"job-posting\"><h3>DevOps Engineer</h3>\
             <p>We are looking for an experienced DevOps Engineer to join our team.</p>\
             <ul><li>Experience with AWS or Azure</li><li>Knowledge of CI/CD pipelines</li>\
             <li>Infrastructure as Code experience</li></ul></div>",
        );
    }
    if developers {
        html.push_str(
            "<div class=\"job-posting\"><h3>Software Developer</h3>\
             <p>Join our development team and work on cutting-edge applications.</p>\
             <ul><li>Experience with Java or Python</li><li>Knowledge of web frameworks</li>\
             <li>Database experience</li></ul></div>",
        );
    }
    html.push_str("</div></body></html>");
    html
}

fn mock_executive(rng: &mut StdRng, source: &str) -> Candidate {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("James");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Smith");
    let title = TECH_TITLES.choose(rng).copied().unwrap_or("CTO");
    let suffix: u32 = rng.gen_range(10_000..=99_999);
    Candidate {
        name: format!("{first} {last}"),
        title: title.to_string(),
        linkedin_url: Some(format!(
            "https://www.linkedin.com/in/{}-{}-{suffix}",
            first.to_lowercase(),
            last.to_lowercase()
        )),
        source: source.to_string(),
    }
}

pub struct SimulatedCareersPage {
    rng: SharedRng,
}

impl SimulatedCareersPage {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl HiringSource for SimulatedCareersPage {
    fn source_id(&self) -> &'static str {
        "careers-page"
    }

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError> {
        let Some(website) = company.company_website.as_deref() else {
            return Ok(ProbeOutcome::nothing());
        };
        let (devops, developers) = coin_pair(&self.rng);
        let html = mock_careers_html(&company.company_name, devops, developers);
        let (devops, developers) = detect_roles(&page_text(&html));
        Ok(ProbeOutcome {
            devops,
            developers,
            source_url: (devops || developers).then(|| careers_page_url(website)),
        })
    }
}

pub struct SimulatedSocialJobs {
    rng: SharedRng,
}

impl SimulatedSocialJobs {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl HiringSource for SimulatedSocialJobs {
    fn source_id(&self) -> &'static str {
        "social-jobs"
    }

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError> {
        let (devops, developers) = coin_pair(&self.rng);
        // A developer hit replaces the DevOps search URL, matching the last query run.
        let source_url = if developers {
            Some(social_jobs_url(&company.company_name, Some("Software Developer")))
        } else if devops {
            Some(social_jobs_url(&company.company_name, Some("DevOps")))
        } else {
            None
        };
        Ok(ProbeOutcome {
            devops,
            developers,
            source_url,
        })
    }
}

pub struct SimulatedJobBoard {
    rng: SharedRng,
}

impl SimulatedJobBoard {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl HiringSource for SimulatedJobBoard {
    fn source_id(&self) -> &'static str {
        "job-board"
    }

    async fn probe(&self, company: &Company) -> Result<ProbeOutcome, SourceError> {
        let (devops, developers) = coin_pair(&self.rng);
        Ok(ProbeOutcome {
            devops,
            developers,
            source_url: (devops || developers)
                .then(|| job_board_url(&company.company_name, company.country)),
        })
    }
}

pub struct SimulatedProfileFinder {
    rng: SharedRng,
}

impl SimulatedProfileFinder {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl ExecutiveFinder for SimulatedProfileFinder {
    fn source_id(&self) -> &'static str {
        "profile-search"
    }

    async fn find(&self, _company: &Company) -> Result<Vec<Candidate>, SourceError> {
        Ok(with_rng(&self.rng, |r| {
            let count = r.gen_range(1..=3);
            (0..count).map(|_| mock_executive(r, MOCK_SOURCE)).collect()
        }))
    }
}

pub struct SimulatedSiteFinder {
    rng: SharedRng,
}

impl SimulatedSiteFinder {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl ExecutiveFinder for SimulatedSiteFinder {
    fn source_id(&self) -> &'static str {
        "company-site"
    }

    async fn find(&self, company: &Company) -> Result<Vec<Candidate>, SourceError> {
        let Some(website) = company.company_website.as_deref() else {
            return Ok(Vec::new());
        };
        let source = leadership_page_url(website);
        Ok(with_rng(&self.rng, |r| {
            if !r.gen_bool(0.5) {
                return Vec::new();
            }
            let count = r.gen_range(1..=2);
            (0..count).map(|_| mock_executive(r, &source)).collect()
        }))
    }
}

pub struct SimulatedContactLookup {
    rng: SharedRng,
}

impl SimulatedContactLookup {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl ContactLookup for SimulatedContactLookup {
    async fn email_pattern(&self, _domain: &str) -> Result<EmailPattern, SourceError> {
        Ok(with_rng(&self.rng, |r| {
            EmailPattern::ALL
                .choose(r)
                .copied()
                .unwrap_or(EmailPattern::FirstDotLast)
        }))
    }

    async fn verify_email(&self, _email: &str) -> Result<bool, SourceError> {
        Ok(with_rng(&self.rng, |r| r.gen_bool(0.8)))
    }

    async fn find_phone(
        &self,
        _executive_name: &str,
        _company: &Company,
    ) -> Result<Option<String>, SourceError> {
        Ok(with_rng(&self.rng, |r| {
            if !r.gen_bool(0.3) {
                return None;
            }
            let country_code = if r.gen_bool(0.7) { "+61" } else { "+64" };
            let area: u8 = r.gen_range(2..=9);
            let first: u16 = r.gen_range(1000..=9999);
            let second: u16 = r.gen_range(1000..=9999);
            Some(format!("{country_code} {area} {first} {second}"))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use leadsheet_core::{Country, HiringFlag, Industry};

    fn company(website: Option<&str>) -> Company {
        Company {
            company_id: 1,
            company_name: "Tower Insurance".into(),
            industry: Industry::Insurance,
            country: Country::NewZealand,
            company_size: None,
            annual_revenue: None,
            company_website: website.map(str::to_string),
            linkedin_url: None,
            actively_hiring: HiringFlag::Unknown,
            hiring_devops: HiringFlag::Unknown,
            hiring_developers: HiringFlag::Unknown,
            devops_source: None,
            developers_source: None,
            data_source: "NZ Insurance".into(),
            last_verified: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        }
    }

    #[test]
    fn mock_careers_page_round_trips_through_keyword_detection() {
        for (devops, developers) in [(false, false), (true, false), (false, true), (true, true)] {
            let html = mock_careers_html("Tower Insurance", devops, developers);
            assert_eq!(detect_roles(&page_text(&html)), (devops, developers));
        }
    }

    #[tokio::test]
    async fn careers_probe_without_website_reports_nothing() {
        let source = SimulatedCareersPage::new(shared_rng(Some(1)));
        let outcome = source.probe(&company(None)).await.unwrap();
        assert_eq!(outcome, ProbeOutcome::nothing());
    }

    #[tokio::test]
    async fn careers_probe_cites_the_careers_path() {
        let source = SimulatedCareersPage::new(shared_rng(Some(7)));
        let target = company(Some("https://www.tower.co.nz"));
        for _ in 0..20 {
            let outcome = source.probe(&target).await.unwrap();
            if outcome.devops || outcome.developers {
                assert_eq!(
                    outcome.source_url.as_deref(),
                    Some("https://www.tower.co.nz/careers")
                );
            } else {
                assert!(outcome.source_url.is_none());
            }
        }
    }

    #[tokio::test]
    async fn profile_finder_returns_one_to_three_mock_executives() {
        let finder = SimulatedProfileFinder::new(shared_rng(Some(3)));
        for _ in 0..25 {
            let found = finder.find(&company(None)).await.unwrap();
            assert!((1..=3).contains(&found.len()));
            for candidate in found {
                assert_eq!(candidate.source, MOCK_SOURCE);
                assert!(TECH_TITLES.contains(&candidate.title.as_str()));
                assert!(candidate
                    .linkedin_url
                    .unwrap()
                    .starts_with("https://www.linkedin.com/in/"));
            }
        }
    }

    #[tokio::test]
    async fn site_finder_sources_from_leadership_page() {
        let finder = SimulatedSiteFinder::new(shared_rng(Some(11)));
        let target = company(Some("https://www.tower.co.nz"));
        let mut seen_any = false;
        for _ in 0..25 {
            let found = finder.find(&target).await.unwrap();
            assert!(found.len() <= 2);
            for candidate in found {
                seen_any = true;
                assert_eq!(candidate.source, "https://www.tower.co.nz/about/leadership");
            }
        }
        assert!(seen_any);
    }

    #[tokio::test]
    async fn phone_numbers_use_anz_country_codes() {
        let lookup = SimulatedContactLookup::new(shared_rng(Some(5)));
        let target = company(None);
        let mut phones = Vec::new();
        for _ in 0..60 {
            if let Some(phone) = lookup.find_phone("Jane Doe", &target).await.unwrap() {
                phones.push(phone);
            }
        }
        assert!(!phones.is_empty());
        for phone in phones {
            let parts: Vec<&str> = phone.split(' ').collect();
            assert_eq!(parts.len(), 4);
            assert!(parts[0] == "+61" || parts[0] == "+64");
            assert_eq!(parts[1].len(), 1);
            assert_eq!(parts[2].len(), 4);
            assert_eq!(parts[3].len(), 4);
        }
    }

    #[tokio::test]
    async fn same_seed_replays_same_answers() {
        let a = SimulatedJobBoard::new(shared_rng(Some(42)));
        let b = SimulatedJobBoard::new(shared_rng(Some(42)));
        let target = company(None);
        for _ in 0..10 {
            assert_eq!(
                a.probe(&target).await.unwrap(),
                b.probe(&target).await.unwrap()
            );
        }
    }
}
