//! Upload audit log.
//!
//! One CSV row per successful upload, appended to a file that is created with a
//! fixed header on first use. Rows are never rewritten.
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use photodrop_core::{AuditSink, Hosting, ImageIdentity, UploadRecord};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const HEADER: [&str; 6] = ["Timestamp", "UserID", "Username", "ImageIdentity", "URL", "Hosting"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvAuditLog {
    /// Open the log at `path`, creating parent directories and the header row if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create audit log directory {}", parent.display()))?;
        }

        let is_new = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        if is_new {
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("create audit log {}", path.display()))?;
            writer.write_record(HEADER)?;
            writer.flush()?;
            info!(path = %path.display(), "Created upload audit log");
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Every row in the log, oldest first.
    pub fn read_records(&self) -> Result<Vec<UploadRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("open audit log {}", self.path.display()))?;
        reader
            .records()
            .enumerate()
            .map(|(i, row)| {
                let row = row?;
                parse_row(&row).with_context(|| format!("audit log row {}", i + 1))
            })
            .collect()
    }

    fn write_row(&self, record: &UploadRecord) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open audit log {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let user_id = record.user_id.to_string();
        writer.write_record([
            timestamp.as_str(),
            user_id.as_str(),
            record.username.as_deref().unwrap_or(""),
            record.identity.as_str(),
            record.url.as_str(),
            record.hosting.name(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

fn parse_row(row: &csv::StringRecord) -> Result<UploadRecord> {
    let field = |i: usize| row.get(i).context("missing column");
    let timestamp = NaiveDateTime::parse_from_str(field(0)?, TIMESTAMP_FORMAT)
        .context("bad timestamp")?
        .and_utc();
    let username = Some(field(2)?).filter(|u| !u.is_empty()).map(str::to_string);
    let hosting: Hosting = field(5)?.parse().map_err(anyhow::Error::msg)?;
    Ok(UploadRecord {
        timestamp,
        user_id: field(1)?.parse().context("bad user id")?,
        username,
        identity: ImageIdentity::new(field(3)?),
        url: field(4)?.to_string(),
        hosting,
    })
}

#[async_trait]
impl AuditSink for CsvAuditLog {
    async fn append_record(&self, record: &UploadRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_row(record)?;
        debug!(identity = %record.identity, hosting = %record.hosting, "Upload recorded");
        Ok(())
    }
}
