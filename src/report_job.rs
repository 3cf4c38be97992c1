use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::time::Instant;
use tracing::{info, info_span};

use crate::directory::{AccountDirectory, AccountLookup};
use crate::fetcher::{self, JobSource};
use crate::partition;
use crate::publisher::{MailSender, ObjectStore, PublishSettings, Publisher};
use crate::report;
use crate::summary;
use crate::types::StepTimings;

/// External services the report run talks to.
pub struct Services<'a> {
    pub jobs: &'a dyn JobSource,
    pub accounts: &'a dyn AccountLookup,
    pub store: &'a dyn ObjectStore,
    pub mailer: &'a dyn MailSender,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub s3_location: String,
    pub message_id: String,
    pub yesterday_jobs: usize,
    pub today_jobs: usize,
}

/// Start of `yesterday` in UTC, the lower bound of the listing window.
pub fn window_start(yesterday: NaiveDate) -> DateTime<Utc> {
    yesterday.and_time(NaiveTime::MIN).and_utc()
}

/// Run the complete report workflow for the UTC day `today`
pub async fn run(
    services: &Services<'_>,
    settings: &PublishSettings,
    today: NaiveDate,
    step_timings: &mut StepTimings,
) -> Result<RunOutcome> {
    let yesterday = today
        .pred_opt()
        .context("Report date has no previous day")?;

    info!(%today, %yesterday, "Report window resolved");

    // Step 1: Fetch jobs
    let _span = info_span!("step_1_fetch_jobs").entered();
    let step1_start = Instant::now();
    let all_jobs = fetcher::fetch_since(services.jobs, window_start(yesterday)).await?;
    let split = partition::partition(all_jobs, today, yesterday);
    step_timings.fetch = step1_start.elapsed().as_secs_f64();
    info!(
        duration_seconds = step_timings.fetch,
        yesterday_jobs = split.yesterday.len(),
        today_jobs = split.today.len(),
        "Job fetch completed"
    );
    drop(_span);

    // Step 2: Aggregate per account
    let _span = info_span!("step_2_aggregate").entered();
    let step2_start = Instant::now();
    let mut directory = AccountDirectory::new(services.accounts);
    let yesterday_summary = summary::aggregate(&split.yesterday, &mut directory).await;
    let today_summary = summary::aggregate(&split.today, &mut directory).await;
    step_timings.aggregate = step2_start.elapsed().as_secs_f64();
    info!(
        duration_seconds = step_timings.aggregate,
        yesterday_accounts = yesterday_summary.len(),
        today_accounts = today_summary.len(),
        yesterday_failed = yesterday_summary.totals().failed,
        today_total = today_summary.totals().total(),
        account_lookups = directory.lookups(),
        unresolved_accounts = directory.fallback_count(),
        "Account summaries built"
    );
    drop(_span);

    // Step 3: Render spreadsheet
    let _span = info_span!("step_3_render").entered();
    let step3_start = Instant::now();
    let artifact = report::render(&split.yesterday, &split.today, &mut directory).await;
    let xlsx = artifact
        .to_xlsx()
        .context("Failed to serialize report workbook")?;
    step_timings.render = step3_start.elapsed().as_secs_f64();
    info!(
        duration_seconds = step_timings.render,
        size_bytes = xlsx.len(),
        "Report workbook rendered"
    );
    drop(_span);

    // Step 4: Upload and email
    let publisher = Publisher::new(services.store, services.mailer, settings);
    let outcome = publisher
        .publish(
            xlsx,
            &yesterday_summary,
            &today_summary,
            yesterday,
            today,
            step_timings,
        )
        .await?;

    Ok(RunOutcome {
        s3_location: outcome.s3_location,
        message_id: outcome.message_id,
        yesterday_jobs: split.yesterday.len(),
        today_jobs: split.today.len(),
    })
}
