//! Consolidator: joins targets with contacts, scores them and writes the final deliverables.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::Utc;
use leadsheet_core::{Company, Contact, ContactFields, Country, Industry, ReportRow};
use leadsheet_storage::{append_error_log, read_csv, write_atomic, write_workbook, StageLayout};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::fs;
use tracing::{error, info, info_span, Instrument};

use crate::{report, workbook, RunContext, StageReport, BRIEF_FILE, CONTACTS_FILE, ERROR_LOG_FILE, TARGETS_FILE, WORKBOOK_FILE};

pub const STAGE: &str = "consolidate";
pub const MAX_QUALITY: u8 = 5;
pub const DEFAULT_NOTE: &str = "Standard opportunity";

static LEGAL_SUFFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\sLtd\.?$",
        r"(?i)\sLimited$",
        r"(?i)\sPty\.?$",
        r"(?i)\sCorp\.?$",
        r"(?i)\sCorporation$",
        r"(?i)\sInc\.?$",
        r"(?i)\sLLC$",
        r"(?i)\sGroup$",
        r"(?i)\sHoldings$",
        r"(?i)\s\(.+\)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

/// Strips legal-entity suffixes, applying each pattern once in order.
pub fn clean_company_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    for pattern in LEGAL_SUFFIXES.iter() {
        cleaned = pattern.replace(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

pub fn quality_score(company: &Company, contact: &ContactFields) -> u8 {
    let checks = [
        !company.company_name.trim().is_empty(),
        company.company_website.is_some() && company.linkedin_url.is_some(),
        contact.name.is_some(),
        contact.title.is_some(),
        contact.linkedin_url.is_some(),
        contact.email.is_some(),
        contact.phone.is_some(),
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8;
    score.min(MAX_QUALITY)
}

pub fn quality_stars(score: u8) -> String {
    let filled = score.min(MAX_QUALITY) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(MAX_QUALITY as usize - filled))
}

pub fn opportunity_score(company: &Company, contact: &ContactFields) -> u32 {
    let mut score = 0;
    if company.hiring_both_roles() {
        score += 3;
    } else if company.hiring_any_role() {
        score += 1;
    }
    if contact.name.is_some() {
        score += 1;
    }
    if contact.email.is_some() {
        score += 2;
    }
    if contact.phone.is_some() {
        score += 2;
    }
    score += match company.company_size {
        Some(size) if size > 10_000 => 3,
        Some(size) if size > 1_000 => 2,
        Some(size) if size > 100 => 1,
        _ => 0,
    };
    score
}

pub fn opportunity_note(company: &Company, contact: &ContactFields) -> String {
    let mut notes = Vec::new();
    if company.hiring_both_roles() {
        notes.push("Actively hiring for both DevOps and Software Developer roles");
    } else if company.hiring_devops.is_yes() {
        notes.push("Currently seeking DevOps talent");
    } else if company.hiring_developers.is_yes() {
        notes.push("Actively recruiting Software Developers");
    }
    match (&contact.email, &contact.phone) {
        (Some(_), Some(_)) => notes.push("Complete C-level contact information available"),
        (Some(_), None) => notes.push("Direct email contact available for decision maker"),
        _ => {}
    }
    match company.company_size {
        Some(size) if size > 5_000 => notes.push("Major enterprise with significant IT needs"),
        Some(size) if size > 1_000 => notes.push("Large company with established IT department"),
        _ => {}
    }
    if notes.is_empty() {
        DEFAULT_NOTE.to_string()
    } else {
        notes.join("; ")
    }
}

fn report_row(company: &Company, contact: ContactFields) -> ReportRow {
    let quality = quality_score(company, &contact);
    ReportRow {
        clean_name: clean_company_name(&company.company_name),
        quality_score: quality,
        quality_stars: quality_stars(quality),
        opportunity_score: opportunity_score(company, &contact),
        opportunity_note: opportunity_note(company, &contact),
        company: company.clone(),
        contact,
    }
}

fn descending<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Left outer join on company id. Every company yields at least one row.
pub fn join_rows(companies: &[Company], contacts: &[Contact]) -> Vec<ReportRow> {
    let mut by_company: HashMap<u32, Vec<&Contact>> = HashMap::new();
    for contact in contacts {
        by_company.entry(contact.company_id).or_default().push(contact);
    }

    let mut rows = Vec::with_capacity(companies.len().max(contacts.len()));
    for company in companies {
        match by_company.get(&company.company_id) {
            Some(found) => rows.extend(
                found
                    .iter()
                    .map(|contact| report_row(company, ContactFields::from(*contact))),
            ),
            None => rows.push(report_row(company, ContactFields::default())),
        }
    }

    if rows.iter().any(|r| r.company.company_size.is_some()) {
        rows.sort_by(|a, b| descending(a.company.company_size, b.company.company_size));
    } else if rows.iter().any(|r| r.company.annual_revenue.is_some()) {
        rows.sort_by(|a, b| descending(a.company.annual_revenue, b.company.annual_revenue));
    }
    rows
}

/// Highest scores first, one row per cleaned name, ties in join order.
pub fn top_opportunities(rows: &[ReportRow], limit: usize) -> Vec<ReportRow> {
    let mut ranked: Vec<&ReportRow> = rows.iter().collect();
    ranked.sort_by(|a, b| b.opportunity_score.cmp(&a.opportunity_score));
    let mut seen = HashSet::new();
    ranked
        .into_iter()
        .filter(|row| seen.insert(row.clean_name.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryMetric {
    pub metric: &'static str,
    pub count: usize,
    pub percentage: String,
}

fn distinct_names(rows: &[ReportRow], keep: impl Fn(&ReportRow) -> bool) -> usize {
    rows.iter()
        .filter(|row| keep(row))
        .map(|row| row.clean_name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Dashboard counts of distinct cleaned names, each with its share of the total.
pub fn summary_metrics(rows: &[ReportRow]) -> Vec<SummaryMetric> {
    let counts = [
        ("Total Companies", distinct_names(rows, |_| true)),
        ("Australian Companies", distinct_names(rows, |r| r.company.country == Country::Australia)),
        ("New Zealand Companies", distinct_names(rows, |r| r.company.country == Country::NewZealand)),
        ("Insurance Companies", distinct_names(rows, |r| r.company.industry == Industry::Insurance)),
        ("Finance Companies", distinct_names(rows, |r| r.company.industry == Industry::Finance)),
        (
            "Companies with Both Classifications",
            distinct_names(rows, |r| r.company.industry == Industry::Both),
        ),
        ("Companies Hiring DevOps", distinct_names(rows, |r| r.company.hiring_devops.is_yes())),
        (
            "Companies Hiring Software Developers",
            distinct_names(rows, |r| r.company.hiring_developers.is_yes()),
        ),
        ("Companies Hiring Both Roles", distinct_names(rows, |r| r.company.hiring_both_roles())),
        ("C-Level Contacts Found", distinct_names(rows, |r| r.contact.name.is_some())),
        ("C-Level Emails Found", distinct_names(rows, |r| r.contact.email.is_some())),
        ("C-Level Phone Numbers Found", distinct_names(rows, |r| r.contact.phone.is_some())),
    ];
    let total = counts[0].1.max(1) as f64;
    counts
        .into_iter()
        .map(|(metric, count)| SummaryMetric {
            metric,
            count,
            percentage: format!("{:.1}%", count as f64 / total * 100.0),
        })
        .collect()
}

async fn build_deliverables(
    layout: &StageLayout,
    run: &RunContext,
    top_n: usize,
) -> Result<StageReport> {
    let companies: Vec<Company> =
        read_csv(&layout.processed(TARGETS_FILE), "leadsheet enrich").await?;
    let contacts: Vec<Contact> =
        read_csv(&layout.processed(CONTACTS_FILE), "leadsheet enrich").await?;

    let rows = join_rows(&companies, &contacts);
    let top = top_opportunities(&rows, top_n);
    let summary = summary_metrics(&rows);

    let book = workbook::build_workbook(&workbook::sheet_tables(&rows, &summary, &top))?;
    let workbook_path = layout.final_file(WORKBOOK_FILE);
    let workbook_file = write_workbook(&workbook_path, &book)
        .await
        .with_context(|| format!("writing {}", workbook_path.display()))?;

    let snapshot_dir = layout.final_dir().join("snapshots");
    fs::create_dir_all(&snapshot_dir)
        .await
        .with_context(|| format!("creating {}", snapshot_dir.display()))?;
    let parquet_path = snapshot_dir.join("report_rows.parquet");
    report::write_report_parquet(&parquet_path, &rows)?;

    let brief_path = layout.final_file(BRIEF_FILE);
    let brief = report::brief_markdown(run, Utc::now(), &rows, &summary, &top);
    let brief_file = write_atomic(&brief_path, brief.as_bytes())
        .await
        .with_context(|| format!("writing {}", brief_path.display()))?;

    let manifest_file = report::write_manifest(
        &snapshot_dir.join("manifest.json"),
        &layout.final_dir(),
        run.run_id,
        &[
            ("workbook", workbook_file.path.clone()),
            ("report_rows", parquet_path),
            ("brief", brief_file.path.clone()),
        ],
    )
    .await?;

    let mut report = StageReport::new(STAGE, companies.len(), rows.len());
    report.record(&workbook_file);
    report.record(&brief_file);
    report.record(&manifest_file);

    info!(
        companies = distinct_names(&rows, |_| true),
        rows = rows.len(),
        with_email = rows.iter().filter(|r| r.contact.email.is_some()).count(),
        top = top.len(),
        "final deliverable written"
    );
    Ok(report)
}

pub async fn run(layout: &StageLayout, run: &RunContext, top_n: usize) -> Result<StageReport> {
    async {
        match build_deliverables(layout, run, top_n).await {
            Ok(report) => Ok(report),
            Err(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "consolidation failed");
                if let Err(log_err) = append_error_log(&layout.final_file(ERROR_LOG_FILE), &message).await {
                    error!(error = %log_err, "could not append to error log");
                }
                Err(err)
            }
        }
    }
    .instrument(info_span!("consolidator"))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use leadsheet_core::{HiringFlag, VerificationStatus};
    use uuid::Uuid;

    fn company(id: u32, name: &str, size: Option<u64>) -> Company {
        Company {
            company_id: id,
            company_name: name.to_string(),
            industry: Industry::Insurance,
            country: Country::Australia,
            company_size: size,
            annual_revenue: None,
            company_website: Some("https://www.suncorpgroup.com.au".into()),
            linkedin_url: Some("https://www.linkedin.com/company/suncorp".into()),
            actively_hiring: HiringFlag::Yes,
            hiring_devops: HiringFlag::Yes,
            hiring_developers: HiringFlag::No,
            devops_source: None,
            developers_source: None,
            data_source: "ASX".into(),
            last_verified: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        }
    }

    fn contact(company_id: u32, name: &str) -> Contact {
        Contact {
            company_id,
            executive_name: name.to_string(),
            executive_title: "Chief Information Officer".into(),
            linkedin_url: None,
            email: Some("a.b@suncorpgroup.com.au".into()),
            phone: Some("+61 7 1234 5678".into()),
            source: "Mock Data".into(),
            verification_status: VerificationStatus::DomainVerified,
        }
    }

    #[test]
    fn legal_suffixes_are_stripped_in_order() {
        assert_eq!(clean_company_name("Suncorp Group"), "Suncorp");
        assert_eq!(clean_company_name("QBE Insurance Group Limited"), "QBE Insurance");
        assert_eq!(clean_company_name("Westpac Banking Corporation"), "Westpac Banking");
        assert_eq!(clean_company_name("Tower Ltd."), "Tower");
        assert_eq!(clean_company_name("AIA (New Zealand)"), "AIA");
        assert_eq!(clean_company_name("Kiwibank"), "Kiwibank");
    }

    #[test]
    fn suncorp_scores_both_roles_and_full_contact() {
        let mut suncorp = company(7, "Suncorp Group", None);
        suncorp.hiring_developers = HiringFlag::Yes;
        let fields = ContactFields::from(&contact(7, "Jane Doe"));
        assert_eq!(opportunity_score(&suncorp, &fields), 3 + 1 + 2 + 2);
        let note = opportunity_note(&suncorp, &fields);
        assert!(note.contains("Actively hiring for both DevOps and Software Developer roles"));
        assert!(note.contains("Complete C-level contact information available"));
    }

    #[test]
    fn company_without_signals_gets_the_standard_note() {
        let mut quiet = company(1, "Quiet Mutual", Some(50));
        quiet.hiring_devops = HiringFlag::No;
        assert_eq!(opportunity_note(&quiet, &ContactFields::default()), DEFAULT_NOTE);
        assert_eq!(opportunity_score(&quiet, &ContactFields::default()), 0);
    }

    #[test]
    fn quality_is_clamped_to_five_stars() {
        let mut fields = ContactFields::from(&contact(1, "Jane Doe"));
        fields.linkedin_url = Some("https://www.linkedin.com/in/jane".into());
        let score = quality_score(&company(1, "Suncorp Group", None), &fields);
        assert_eq!(score, 5);
        assert_eq!(quality_stars(score), "★★★★★");
        assert_eq!(quality_stars(2), "★★☆☆☆");
    }

    #[test]
    fn join_is_left_outer() {
        let companies = vec![
            company(1, "Alpha Ltd", None),
            company(2, "Beta Limited", None),
            company(3, "Gamma Pty", None),
        ];
        let contacts = vec![contact(1, "Ann Lee"), contact(1, "Bob Ray"), contact(3, "Cy Ong")];
        let rows = join_rows(&companies, &contacts);
        let pairs: Vec<(u32, Option<&str>)> = rows
            .iter()
            .map(|r| (r.company.company_id, r.contact.name.as_deref()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (1, Some("Ann Lee")),
                (1, Some("Bob Ray")),
                (2, None),
                (3, Some("Cy Ong")),
            ]
        );
        assert_eq!(rows[2].clean_name, "Beta");
    }

    #[test]
    fn join_sorts_by_size_with_missing_sizes_last() {
        let companies = vec![
            company(1, "Small", Some(200)),
            company(2, "Unknown Size", None),
            company(3, "Large", Some(20_000)),
        ];
        let ids: Vec<u32> = join_rows(&companies, &[]).iter().map(|r| r.company.company_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn top_ten_of_fifteen_keeps_highest_scores_and_join_order_for_ties() {
        let companies: Vec<Company> = (1..=15)
            .map(|id| company(id, &format!("Company {id}"), None))
            .collect();
        let contacts: Vec<Contact> = (1..=15)
            .filter(|id| id % 3 == 0)
            .map(|id| contact(id, "Jane Doe"))
            .collect();
        let rows = join_rows(&companies, &contacts);
        let top = top_opportunities(&rows, 10);
        let ids: Vec<u32> = top.iter().map(|r| r.company.company_id).collect();
        assert_eq!(ids, vec![3, 6, 9, 12, 15, 1, 2, 4, 5, 7]);
    }

    #[test]
    fn top_list_dedups_by_cleaned_name() {
        let companies = vec![company(1, "Tower Ltd", None), company(2, "Tower Limited", None)];
        let contacts = vec![contact(2, "Jane Doe")];
        let top = top_opportunities(&join_rows(&companies, &contacts), 10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].company.company_id, 2);
    }

    #[test]
    fn summary_counts_distinct_names_with_percentages() {
        let mut nz = company(2, "Kiwi Group", None);
        nz.country = Country::NewZealand;
        let rows = join_rows(
            &[company(1, "Suncorp Group", None), nz],
            &[contact(1, "Ann Lee"), contact(1, "Bob Ray")],
        );
        let summary = summary_metrics(&rows);
        assert_eq!(summary.len(), 12);
        assert_eq!(summary[0].metric, "Total Companies");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].percentage, "100.0%");
        assert_eq!(summary[2].count, 1);
        assert_eq!(summary[2].percentage, "50.0%");
        assert_eq!(summary[9].metric, "C-Level Contacts Found");
        assert_eq!(summary[9].count, 1);
    }

    #[test]
    fn empty_report_has_zero_percentages() {
        let summary = summary_metrics(&[]);
        assert!(summary.iter().all(|m| m.count == 0 && m.percentage == "0.0%"));
    }

    #[tokio::test]
    async fn missing_inputs_are_logged_and_returned() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StageLayout::new(dir.path());
        let context = RunContext {
            run_id: Uuid::new_v4(),
            provider: "simulated",
            started_at: Utc::now(),
        };
        let err = run(&layout, &context, 10).await.unwrap_err();
        assert!(format!("{err:#}").contains("leadsheet enrich"));
        let log = std::fs::read_to_string(layout.final_file(ERROR_LOG_FILE)).unwrap();
        assert!(log.starts_with("Error occurred at "));
    }
}
