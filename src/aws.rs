//! AWS SDK implementations of the collaborator traits.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_backup::types::BackupJob;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_ses::primitives::Blob;
use aws_sdk_ses::types::RawMessage;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::directory::AccountLookup;
use crate::fetcher::{JobPage, JobSource};
use crate::publisher::{MailSender, ObjectStore};
use crate::types::BackupJobRecord;

/// Every backup job in the organization, not only the caller's account.
const ALL_ACCOUNTS: &str = "*";

pub struct AwsClients {
    pub backup: aws_sdk_backup::Client,
    pub organizations: aws_sdk_organizations::Client,
    pub s3: aws_sdk_s3::Client,
    pub ses: aws_sdk_ses::Client,
    pub region: String,
}

impl AwsClients {
    pub async fn new(region: Option<String>) -> Self {
        let config = if let Some(region) = &region {
            info!(region = %region, "Using explicit AWS region");
            aws_config::defaults(BehaviorVersion::latest())
                .region(aws_config::Region::new(region.clone()))
                .load()
                .await
        } else {
            debug!("Using default AWS region from environment/IMDS");
            aws_config::load_defaults(BehaviorVersion::latest()).await
        };

        let region_name = config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        info!(region = %region_name, "AWS clients initialized");

        Self {
            backup: aws_sdk_backup::Client::new(&config),
            organizations: aws_sdk_organizations::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
            ses: aws_sdk_ses::Client::new(&config),
            region: region_name,
        }
    }
}

#[async_trait]
impl JobSource for aws_sdk_backup::Client {
    async fn list_page(
        &self,
        created_after: DateTime<Utc>,
        next_token: Option<String>,
    ) -> Result<JobPage> {
        let response = self
            .list_backup_jobs()
            .by_account_id(ALL_ACCOUNTS)
            .by_created_after(aws_smithy_types::DateTime::from_secs(
                created_after.timestamp(),
            ))
            .set_next_token(next_token)
            .send()
            .await
            .context("ListBackupJobs request failed")?;

        Ok(JobPage {
            jobs: response.backup_jobs().iter().map(to_record).collect(),
            next_token: response.next_token().map(str::to_string),
        })
    }
}

#[async_trait]
impl AccountLookup for aws_sdk_organizations::Client {
    async fn account_name(&self, account_id: &str) -> Result<String> {
        let response = self
            .describe_account()
            .account_id(account_id)
            .send()
            .await
            .context("DescribeAccount request failed")?;

        response
            .account()
            .and_then(|account| account.name())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("DescribeAccount returned no name for {}", account_id))
    }
}

#[async_trait]
impl ObjectStore for aws_sdk_s3::Client {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("PutObject request failed")?;
        Ok(())
    }
}

#[async_trait]
impl MailSender for aws_sdk_ses::Client {
    async fn send_raw(&self, source: &str, destinations: &[String], raw: Vec<u8>) -> Result<String> {
        let raw_message = RawMessage::builder()
            .data(Blob::new(raw))
            .build()
            .context("Failed to build SES raw message")?;

        let response = self
            .send_raw_email()
            .source(source)
            .set_destinations(Some(destinations.to_vec()))
            .raw_message(raw_message)
            .send()
            .await
            .context("SendRawEmail request failed")?;

        Ok(response.message_id().to_string())
    }
}

fn to_record(job: &BackupJob) -> BackupJobRecord {
    BackupJobRecord {
        backup_job_id: job.backup_job_id().map(str::to_string),
        account_id: job.account_id().map(str::to_string),
        state: job.state().map(|s| s.as_str().to_string()),
        resource_arn: job.resource_arn().map(str::to_string),
        resource_name: job.resource_name().map(str::to_string),
        resource_type: job.resource_type().map(str::to_string),
        status_message: job.status_message().map(str::to_string),
        creation_date: job
            .creation_date()
            .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())),
    }
}
