//! Static report content plus the run brief, parquet snapshot and manifest.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{Float64Array, RecordBatch, StringArray, UInt32Array, UInt64Array, UInt8Array};
use arrow_schema::{DataType, Field, Schema};
use chrono::{DateTime, Utc};
use leadsheet_core::ReportRow;
use leadsheet_storage::{file_digest, write_atomic, StoredFile};
use parquet::arrow::ArrowWriter;
use serde::Serialize;
use uuid::Uuid;

use crate::consolidate::SummaryMetric;
use crate::RunContext;

const METHODOLOGY: &[(&str, &[&str])] = &[
    (
        "Data Collection Process",
        &[
            "1. Identified top ANZ insurance and finance companies using:",
            "   - ASX 200 and NZX 50 listings",
            "   - Industry rankings from IBISWorld and similar sources",
            "   - Financial regulatory bodies (APRA, RBNZ, etc.)",
            "   - Industry associations and membership directories",
            "   - Business directories and financial news sources",
        ],
    ),
    (
        "Company Verification and Enrichment",
        &[
            "1. Verified company information through:",
            "   - Official company websites",
            "   - LinkedIn company pages",
            "   - Annual reports and investor presentations",
            "   - Financial news and industry publications",
            "",
            "2. Enriched basic company data with:",
            "   - Company size (employee count)",
            "   - Annual revenue figures",
            "   - Industry classification refinement",
            "   - Website and social media verification",
        ],
    ),
    (
        "Hiring Status Verification",
        &[
            "1. Verified active hiring for DevOps and Software Developer roles through:",
            "   - Company career pages and job listings",
            "   - LinkedIn Jobs search for each company",
            "   - Seek.com.au and Seek.co.nz job boards",
            "   - Indeed Australia and New Zealand listings",
            "",
            "2. Documentation of job listings:",
            "   - Saved URLs to specific job postings",
            "   - Verified job posting dates (filtered for active listings)",
            "   - Confirmed role titles and departments",
        ],
    ),
    (
        "C-Level Contact Identification",
        &[
            "1. Identified technology decision makers through:",
            "   - Company leadership pages",
            "   - LinkedIn advanced search filtering by title and company",
            "   - Recent conference speakers and industry events",
            "   - Tech press releases and news mentions",
            "",
            "2. Prioritized the following roles:",
            "   - CTO (Chief Technology Officer)",
            "   - CIO (Chief Information Officer)",
            "   - CDO (Chief Digital Officer)",
            "   - VP/Head of Technology/Engineering",
            "   - Director of IT/Technology",
        ],
    ),
    (
        "Contact Information Enrichment",
        &[
            "1. Generated and verified email addresses using:",
            "   - Email pattern analysis for each company",
            "   - Standard business email formats",
            "   - Domain MX record verification",
            "",
            "2. Sourced phone numbers where available from:",
            "   - Public company directories",
            "   - Professional profiles and contact information",
            "",
            "3. All contact data was ethically sourced from:",
            "   - Publicly available information only",
            "   - Professional business contexts",
            "   - Sources where contact sharing is expected for business purposes",
        ],
    ),
    (
        "Data Quality Assurance",
        &[
            "1. Verification methodology:",
            "   - Cross-referenced information across multiple sources",
            "   - Prioritized primary sources over secondary sources",
            "   - Implemented data quality scoring for transparency",
            "   - Flagged uncertain data points for review",
            "",
            "2. Data standardization:",
            "   - Normalized company names to remove legal entity suffixes",
            "   - Standardized phone number formats",
            "   - Verified URL formats and accessibility",
            "   - Confirmed job titles match industry standards",
        ],
    ),
];

/// Methodology sheet lines: each section title, a blank, its items, then two blanks.
pub fn methodology_lines() -> Vec<String> {
    let mut lines = Vec::new();
    for (section, items) in METHODOLOGY {
        lines.push(section.to_string());
        lines.push(String::new());
        lines.extend(items.iter().map(|item| item.to_string()));
        lines.push(String::new());
        lines.push(String::new());
    }
    lines
}

#[derive(Debug, Clone, Copy)]
pub struct SourceRow {
    pub kind: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub gathered: &'static str,
}

const fn source(
    kind: &'static str,
    name: &'static str,
    url: &'static str,
    gathered: &'static str,
) -> SourceRow {
    SourceRow { kind, name, url, gathered }
}

pub const SOURCES: [SourceRow; 16] = [
    source("Stock Exchange", "ASX 200", "https://www.asx.com.au", "Company identification, market cap"),
    source("Stock Exchange", "NZX 50", "https://www.nzx.com", "Company identification, market cap"),
    source(
        "Regulatory Body",
        "Australian Prudential Regulation Authority (APRA)",
        "https://www.apra.gov.au",
        "Registered financial entities in Australia",
    ),
    source(
        "Regulatory Body",
        "Reserve Bank of New Zealand (RBNZ)",
        "https://www.rbnz.govt.nz",
        "Registered banks in New Zealand",
    ),
    source(
        "Industry Association",
        "Insurance Council of Australia",
        "https://www.insurancecouncil.com.au",
        "Insurance company verification, industry data",
    ),
    source(
        "Industry Association",
        "Financial Services Council NZ",
        "https://www.fsc.org.nz",
        "Financial services company verification",
    ),
    source(
        "Business Directory",
        "IBISWorld Australia",
        "https://www.ibisworld.com/au",
        "Industry classification, revenue figures",
    ),
    source(
        "Business Directory",
        "Kompass Business Directory",
        "https://nz.kompass.com",
        "Company contact information",
    ),
    source("Job Board", "Seek Australia/NZ", "https://www.seek.com.au", "Active hiring status, roles"),
    source(
        "Job Board",
        "Indeed Australia/NZ",
        "https://au.indeed.com",
        "Additional job listings verification",
    ),
    source(
        "Professional Network",
        "LinkedIn",
        "https://www.linkedin.com",
        "Company size, C-level contacts, company pages",
    ),
    source("Email Verification", "Domain MX lookup", "N/A (DNS lookup)", "Email format verification"),
    source(
        "Company Websites",
        "Company Websites (various)",
        "Various company domains",
        "Leadership teams, job listings, contact info",
    ),
    source(
        "Financial News",
        "Australian Financial Review",
        "https://www.afr.com",
        "Recent company news, financial updates",
    ),
    source(
        "Industry Publication",
        "Insurance Business Magazine",
        "https://www.insurancebusinessmag.com",
        "Industry-specific news and rankings",
    ),
    source(
        "Data Enrichment Service",
        "Clay.com (as suggested in assessment)",
        "https://clay.com",
        "Contact data enrichment (if used)",
    ),
];

pub fn brief_markdown(
    run: &RunContext,
    finished_at: DateTime<Utc>,
    rows: &[ReportRow],
    summary: &[SummaryMetric],
    top: &[ReportRow],
) -> String {
    let metrics = summary
        .iter()
        .map(|m| format!("- {}: {} ({})", m.metric, m.count, m.percentage))
        .collect::<Vec<_>>()
        .join("\n");
    let opportunities = top
        .iter()
        .enumerate()
        .map(|(index, row)| {
            format!(
                "{}. {} (score {}): {}",
                index + 1,
                row.clean_name,
                row.opportunity_score,
                row.opportunity_note
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "# Lead Sheet Brief\n\n- Run ID: `{}`\n- Provider: {}\n- Started: {}\n- Finished: {}\n- Report rows: {}\n\n## Summary\n{}\n\n## Top Opportunities\n{}\n",
        run.run_id,
        run.provider,
        run.started_at,
        finished_at,
        rows.len(),
        metrics,
        opportunities
    )
}

fn write_parquet(path: &Path, batch: RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("opening parquet writer {}", path.display()))?;
    writer
        .write(&batch)
        .with_context(|| format!("writing record batch {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("closing parquet writer {}", path.display()))?;
    Ok(())
}

pub fn report_rows_batch(rows: &[ReportRow]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("company_id", DataType::UInt32, false),
        Field::new("company_name", DataType::Utf8, false),
        Field::new("industry", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("company_size", DataType::UInt64, true),
        Field::new("annual_revenue", DataType::Float64, true),
        Field::new("hiring_devops", DataType::Utf8, false),
        Field::new("hiring_developers", DataType::Utf8, false),
        Field::new("contact_name", DataType::Utf8, true),
        Field::new("contact_email", DataType::Utf8, true),
        Field::new("contact_phone", DataType::Utf8, true),
        Field::new("quality_score", DataType::UInt8, false),
        Field::new("opportunity_score", DataType::UInt32, false),
    ]));

    let ids = UInt32Array::from(rows.iter().map(|r| r.company.company_id).collect::<Vec<_>>());
    let names = StringArray::from(rows.iter().map(|r| r.clean_name.as_str()).collect::<Vec<_>>());
    let industries = StringArray::from(
        rows.iter()
            .map(|r| r.company.industry.as_str())
            .collect::<Vec<_>>(),
    );
    let countries = StringArray::from(
        rows.iter()
            .map(|r| r.company.country.as_str())
            .collect::<Vec<_>>(),
    );
    let sizes = UInt64Array::from(rows.iter().map(|r| r.company.company_size).collect::<Vec<_>>());
    let revenues =
        Float64Array::from(rows.iter().map(|r| r.company.annual_revenue).collect::<Vec<_>>());
    let devops = StringArray::from(
        rows.iter()
            .map(|r| r.company.hiring_devops.as_str())
            .collect::<Vec<_>>(),
    );
    let developers = StringArray::from(
        rows.iter()
            .map(|r| r.company.hiring_developers.as_str())
            .collect::<Vec<_>>(),
    );
    let contact_names =
        StringArray::from(rows.iter().map(|r| r.contact.name.as_deref()).collect::<Vec<_>>());
    let emails =
        StringArray::from(rows.iter().map(|r| r.contact.email.as_deref()).collect::<Vec<_>>());
    let phones =
        StringArray::from(rows.iter().map(|r| r.contact.phone.as_deref()).collect::<Vec<_>>());
    let quality = UInt8Array::from(rows.iter().map(|r| r.quality_score).collect::<Vec<_>>());
    let opportunity =
        UInt32Array::from(rows.iter().map(|r| r.opportunity_score).collect::<Vec<_>>());

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(names),
            Arc::new(industries),
            Arc::new(countries),
            Arc::new(sizes),
            Arc::new(revenues),
            Arc::new(devops),
            Arc::new(developers),
            Arc::new(contact_names),
            Arc::new(emails),
            Arc::new(phones),
            Arc::new(quality),
            Arc::new(opportunity),
        ],
    )
    .context("building report rows record batch")
}

pub fn write_report_parquet(path: &Path, rows: &[ReportRow]) -> Result<()> {
    write_parquet(path, report_rows_batch(rows)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotManifest {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ManifestFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestFile {
    pub name: String,
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

async fn manifest_entry(name: &str, base: &Path, path: &Path) -> Result<ManifestFile> {
    let stored = file_digest(path)
        .await
        .with_context(|| format!("hashing {}", path.display()))?;
    let rel = path
        .strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string();
    Ok(ManifestFile {
        name: name.to_string(),
        path: rel,
        sha256: stored.content_hash,
        bytes: stored.byte_size as u64,
    })
}

/// Records a digest for every named output, with paths relative to `base`.
pub async fn write_manifest(
    manifest_path: &Path,
    base: &Path,
    run_id: Uuid,
    outputs: &[(&str, PathBuf)],
) -> Result<StoredFile> {
    let mut files = Vec::with_capacity(outputs.len());
    for (name, path) in outputs {
        files.push(manifest_entry(name, base, path).await?);
    }
    let manifest = SnapshotManifest {
        schema_version: 1,
        run_id,
        generated_at: Utc::now(),
        files,
    };
    let bytes = serde_json::to_vec_pretty(&manifest).context("serializing snapshot manifest")?;
    write_atomic(manifest_path, &bytes)
        .await
        .with_context(|| format!("writing {}", manifest_path.display()))
}
