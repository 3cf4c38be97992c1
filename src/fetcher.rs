use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::types::BackupJobRecord;

/// One page of ListBackupJobs output.
#[derive(Debug, Default)]
pub struct JobPage {
    pub jobs: Vec<BackupJobRecord>,
    pub next_token: Option<String>,
}

/// Source of backup jobs across all accounts of the organization.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn list_page(
        &self,
        created_after: DateTime<Utc>,
        next_token: Option<String>,
    ) -> Result<JobPage>;
}

/// Drain every page of jobs created at or after `cutoff`, keeping API order.
pub async fn fetch_since(
    source: &dyn JobSource,
    cutoff: DateTime<Utc>,
) -> Result<Vec<BackupJobRecord>> {
    let fetch_start = Instant::now();
    let mut jobs = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0;

    info!(
        created_after = %cutoff.to_rfc3339(),
        "Listing backup jobs for all accounts"
    );

    loop {
        let page = source
            .list_page(cutoff, next_token.take())
            .await
            .map_err(|e| ReportError::JobListing(format!("{:#}", e)))
            .context("Failed to list backup jobs")?;

        pages += 1;
        debug!(
            page = pages,
            batch_size = page.jobs.len(),
            total_listed = jobs.len() + page.jobs.len(),
            "Retrieved backup jobs batch"
        );
        jobs.extend(page.jobs);

        match page.next_token {
            Some(token) if !token.is_empty() => {
                debug!("More backup jobs available, continuing pagination");
                next_token = Some(token);
            }
            _ => break,
        }
    }

    info!(
        total_jobs = jobs.len(),
        pages,
        duration_seconds = fetch_start.elapsed().as_secs_f64(),
        "Backup job listing completed"
    );

    Ok(jobs)
}
