//! Core domain model shared by every pipeline stage.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "leadsheet-core";

/// Title used for the stand-in contact when no executive could be found.
pub const PLACEHOLDER_TITLE: &str = "CTO or equivalent";
pub const PLACEHOLDER_NAME: &str = "Technology Decision Maker";
pub const PLACEHOLDER_SOURCE: &str = "Placeholder - requires manual research";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Tri-state hiring indicator. Persisted as the literal strings `Yes`, `No` and `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HiringFlag {
    Yes,
    No,
    #[default]
    Unknown,
}

impl HiringFlag {
    pub fn is_yes(self) -> bool {
        matches!(self, HiringFlag::Yes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HiringFlag::Yes => "Yes",
            HiringFlag::No => "No",
            HiringFlag::Unknown => "Unknown",
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            HiringFlag::Yes
        } else {
            HiringFlag::No
        }
    }

    /// Collapses anything that is not `Yes` into `No`.
    pub fn settle(self) -> Self {
        HiringFlag::from_bool(self.is_yes())
    }
}

impl fmt::Display for HiringFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    Finance,
    Insurance,
    Both,
}

impl Industry {
    pub fn as_str(self) -> &'static str {
        match self {
            Industry::Finance => "Finance",
            Industry::Insurance => "Insurance",
            Industry::Both => "Both",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    Australia,
    #[serde(rename = "New Zealand")]
    NewZealand,
}

impl Country {
    pub fn as_str(self) -> &'static str {
        match self {
            Country::Australia => "Australia",
            Country::NewZealand => "New Zealand",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static catalog literal, before ids and defaults are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanySeed {
    pub company_name: &'static str,
    pub industry: Industry,
    pub country: Country,
    pub data_source: &'static str,
    pub company_website: &'static str,
}

/// A company carried through all four stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub company_id: u32,
    pub company_name: String,
    pub industry: Industry,
    pub country: Country,
    pub company_size: Option<u64>,
    pub annual_revenue: Option<f64>,
    pub company_website: Option<String>,
    pub linkedin_url: Option<String>,
    pub actively_hiring: HiringFlag,
    pub hiring_devops: HiringFlag,
    pub hiring_developers: HiringFlag,
    /// URL of the probe that first reported DevOps hiring.
    pub devops_source: Option<String>,
    pub developers_source: Option<String>,
    pub data_source: String,
    pub last_verified: NaiveDate,
}

impl Company {
    pub fn hiring_any_role(&self) -> bool {
        self.hiring_devops.is_yes() || self.hiring_developers.is_yes()
    }

    pub fn hiring_both_roles(&self) -> bool {
        self.hiring_devops.is_yes() && self.hiring_developers.is_yes()
    }
}

/// Result of one hiring-source probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub devops: bool,
    pub developers: bool,
    pub source_url: Option<String>,
}

impl ProbeOutcome {
    pub fn nothing() -> Self {
        Self::default()
    }
}

/// A person surfaced by an executive finder, before contact details are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub title: String,
    pub linkedin_url: Option<String>,
    pub source: String,
}

impl Candidate {
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            linkedin_url: None,
            source: PLACEHOLDER_SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[serde(rename = "Domain MX Verified")]
    DomainVerified,
    #[serde(rename = "Not Verified")]
    NotVerified,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::DomainVerified => "Domain MX Verified",
            VerificationStatus::NotVerified => "Not Verified",
        }
    }
}

/// Executive contact attached to one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub company_id: u32,
    pub executive_name: String,
    pub executive_title: String,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: String,
    pub verification_status: VerificationStatus,
}

/// Contact columns of a report row; all empty when the company has no contact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ContactFields {
    pub name: Option<String>,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&Contact> for ContactFields {
    fn from(contact: &Contact) -> Self {
        Self {
            name: Some(contact.executive_name.clone()),
            title: Some(contact.executive_title.clone()),
            linkedin_url: contact.linkedin_url.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}

/// One row of the final company sheet: a company joined with at most one contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub company: Company,
    pub clean_name: String,
    pub contact: ContactFields,
    pub quality_score: u8,
    pub quality_stars: String,
    pub opportunity_score: u32,
    pub opportunity_note: String,
}
