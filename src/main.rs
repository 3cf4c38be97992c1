use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::time::Instant;
use tracing::{error, info, info_span};

mod aws;
mod cli;
mod directory;
mod email;
mod error;
mod fetcher;
mod logging;
mod partition;
mod publisher;
mod report;
mod report_job;
mod summary;
mod types;

use aws::AwsClients;
use cli::Args;
use publisher::PublishSettings;
use report_job::Services;
use types::{InvocationBody, InvocationResult, StepTimings};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_format, &args.log_level);

    args.validate().context("Configuration validation failed")?;

    let settings = PublishSettings {
        bucket: args.bucket_name.clone(),
        from: args.from_email.clone(),
        to: args.to_recipients(),
        cc: args.cc_recipients(),
        subject_prefix: args.subject_prefix.clone(),
        signature: args.signature.clone(),
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bucket_name = %settings.bucket,
        from_email = %settings.from,
        to_count = settings.to.len(),
        cc_count = settings.cc.len(),
        "Backup report started"
    );

    let clients = AwsClients::new(args.region.clone()).await;

    let _span = info_span!(
        "backup_report",
        bucket_name = %settings.bucket,
        region = %clients.region
    )
    .entered();

    let services = Services {
        jobs: &clients.backup,
        accounts: &clients.organizations,
        store: &clients.s3,
        mailer: &clients.ses,
    };

    let run_start = Instant::now();
    let mut step_timings = StepTimings::default();
    let today = Utc::now().date_naive();

    match report_job::run(&services, &settings, today, &mut step_timings).await {
        Ok(outcome) => {
            let total_time = run_start.elapsed().as_secs_f64();

            info!(
                fetch_seconds = step_timings.fetch,
                aggregate_seconds = step_timings.aggregate,
                render_seconds = step_timings.render,
                upload_seconds = step_timings.upload,
                email_seconds = step_timings.email,
                total_execution_seconds = total_time,
                "Execution timing summary"
            );

            info!(
                status = "success",
                s3_location = %outcome.s3_location,
                message_id = %outcome.message_id,
                yesterday_jobs = outcome.yesterday_jobs,
                today_jobs = outcome.today_jobs,
                total_execution_seconds = total_time,
                "Backup report completed successfully"
            );

            let result = InvocationResult {
                status_code: 200,
                body: InvocationBody {
                    message: "Reporte generado y enviado exitosamente".to_string(),
                    s3_location: outcome.s3_location,
                    yesterday_jobs: outcome.yesterday_jobs,
                    today_jobs: outcome.today_jobs,
                },
                step_timings,
            };

            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            let total_time = run_start.elapsed().as_secs_f64();

            error!(
                status = "failed",
                error = %format!("{:#}", e),
                fetch_seconds = step_timings.fetch,
                upload_seconds = step_timings.upload,
                total_execution_seconds = total_time,
                "Backup report failed"
            );

            Err(e)
        }
    }
}
