//! Stage directory layout, atomic table files, and paced HTTP fetch utilities.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use rand::Rng;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "leadsheet-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("input file {} not found; run `{hint}` first", .path.display())]
    MissingInput { path: PathBuf, hint: String },
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv failure on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("spreadsheet failure on {}: {message}", .path.display())]
    Spreadsheet { path: PathBuf, message: String },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StorageError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The raw → processed → final directory tree every stage reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLayout {
    root: PathBuf,
}

impl StageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn final_dir(&self) -> PathBuf {
        self.root.join("final")
    }

    pub fn raw(&self, file_name: &str) -> PathBuf {
        self.raw_dir().join(file_name)
    }

    pub fn processed(&self, file_name: &str) -> PathBuf {
        self.processed_dir().join(file_name)
    }

    pub fn final_file(&self, file_name: &str) -> PathBuf {
        self.final_dir().join(file_name)
    }

    pub async fn ensure(&self) -> Result<(), StorageError> {
        for dir in [self.raw_dir(), self.processed_dir(), self.final_dir()] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::io(&dir, e))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub content_hash: String,
    pub byte_size: usize,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Writes `bytes` to a sibling temp file and renames it over `path`.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<StoredFile, StorageError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .await
        .map_err(|e| StorageError::io(parent, e))?;

    let temp_path = parent.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await
        .map_err(|e| StorageError::io(&temp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StorageError::io(&temp_path, e))?;
    file.flush()
        .await
        .map_err(|e| StorageError::io(&temp_path, e))?;
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::io(path, err));
    }

    Ok(StoredFile {
        path: path.to_path_buf(),
        content_hash: sha256_hex(bytes),
        byte_size: bytes.len(),
    })
}

/// Serializes rows into CSV bytes with a header row taken from the record fields.
pub fn csv_bytes<T: Serialize>(path: &Path, rows: &[T]) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| StorageError::csv(path, e))?;
    }
    writer
        .into_inner()
        .map_err(|e| StorageError::io(path, e.into_error()))
}

pub async fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<StoredFile, StorageError> {
    let bytes = csv_bytes(path, rows)?;
    let stored = write_atomic(path, &bytes).await?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv table");
    Ok(stored)
}

/// Reads every row of a stage table. Rows that fail to parse are logged and skipped.
pub async fn read_csv<T: DeserializeOwned>(path: &Path, hint: &str) -> Result<Vec<T>, StorageError> {
    if !fs::try_exists(path)
        .await
        .map_err(|e| StorageError::io(path, e))?
    {
        return Err(StorageError::MissingInput {
            path: path.to_path_buf(),
            hint: hint.to_string(),
        });
    }

    let bytes = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) => warn!(path = %path.display(), row = index + 1, error = %err, "skipping unreadable row"),
        }
    }
    Ok(rows)
}

/// Writes a plain single-sheet workbook mirroring the CSV layout of `rows`.
pub async fn write_xlsx_snapshot<T: Serialize>(
    path: &Path,
    sheet_name: &str,
    rows: &[T],
) -> Result<StoredFile, StorageError> {
    let bytes = csv_bytes(path, rows)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes.as_slice());

    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(sheet_name)
        .map_err(|message| StorageError::Spreadsheet {
            path: path.to_path_buf(),
            message: message.to_string(),
        })?;

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| StorageError::csv(path, e))?;
        for (col_idx, value) in record.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .get_cell_mut((col_idx as u32 + 1, row_idx as u32 + 1))
                .set_value(value);
        }
    }

    write_workbook(path, &book).await
}

/// Saves a workbook through a temp file so readers never see a partial file.
pub async fn write_workbook(
    path: &Path,
    book: &umya_spreadsheet::Spreadsheet,
) -> Result<StoredFile, StorageError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .await
        .map_err(|e| StorageError::io(parent, e))?;

    let temp_path = parent.join(format!(".{}.xlsx.tmp", Uuid::new_v4()));
    umya_spreadsheet::writer::xlsx::write(book, &temp_path).map_err(|e| {
        StorageError::Spreadsheet {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    let bytes = fs::read(&temp_path)
        .await
        .map_err(|e| StorageError::io(&temp_path, e))?;

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::io(path, err));
    }

    Ok(StoredFile {
        path: path.to_path_buf(),
        content_hash: sha256_hex(&bytes),
        byte_size: bytes.len(),
    })
}

/// Appends one timestamped line to a plain-text error log.
pub async fn append_error_log(path: &Path, message: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    let line = format!("Error occurred at {}: {}\n", Utc::now().to_rfc3339(), message);
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.flush().await.map_err(|e| StorageError::io(path, e))
}

pub async fn file_digest(path: &Path) -> Result<StoredFile, StorageError> {
    let bytes = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
    Ok(StoredFile {
        path: path.to_path_buf(),
        content_hash: sha256_hex(&bytes),
        byte_size: bytes.len(),
    })
}

/// Random delay window used to space out companies and outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::between_millis(100, 300)
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn between_millis(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min: Duration::from_millis(lo),
            max: Duration::from_millis(hi),
        }
    }

    pub fn sample(&self) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if hi == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub backoff: BackoffPolicy,
    pub pacing: Pacing,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: None,
            backoff: BackoffPolicy::default(),
            pacing: Pacing::between_millis(1_000, 3_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub final_url: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Sequential GET client: one request at a time, paced, with bounded backoff.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    backoff: BackoffPolicy,
    pacing: Pacing,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self {
            client,
            backoff: config.backoff,
            pacing: config.pacing,
        })
    }

    pub async fn fetch_text(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let span = info_span!("http_fetch", url);
        async {
            let mut attempt = 0usize;
            loop {
                self.pacing.pause().await;
                match self.client.get(url).send().await {
                    Ok(resp) => {
                        let status = resp.status();
                        let final_url = resp.url().to_string();
                        if status.is_success() {
                            let body = resp.text().await?;
                            return Ok(FetchedPage {
                                status,
                                final_url,
                                body,
                            });
                        }
                        if classify_status(status) == RetryDisposition::Retryable
                            && attempt < self.backoff.max_retries
                        {
                            tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(FetchError::HttpStatus {
                            status: status.as_u16(),
                            url: final_url,
                        });
                    }
                    Err(err) => {
                        if classify_reqwest_error(&err) == RetryDisposition::Retryable
                            && attempt < self.backoff.max_retries
                        {
                            tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(FetchError::Request(err));
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}
