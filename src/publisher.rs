use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::time::Instant;
use tracing::{error, info, info_span};

use crate::email::{self, Attachment, EmailMessage};
use crate::error::ReportError;
use crate::report::XLSX_CONTENT_TYPE;
use crate::types::{DailySummary, StepTimings};

/// Write-once blob storage (S3 PutObject).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
}

/// Raw MIME email relay (SES SendRawEmail). Returns the provider message id.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_raw(&self, source: &str, destinations: &[String], raw: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub bucket: String,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject_prefix: String,
    pub signature: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub s3_location: String,
    pub message_id: String,
}

pub fn report_filename(today: NaiveDate) -> String {
    format!("backup-report-{}.xlsx", today.format("%Y-%m-%d"))
}

/// `reports/<YYYY>/<MM>/backup-report-<YYYY-MM-DD>.xlsx`
pub fn report_key(today: NaiveDate) -> String {
    format!("reports/{}/{}", today.format("%Y/%m"), report_filename(today))
}

pub struct Publisher<'a> {
    store: &'a dyn ObjectStore,
    mailer: &'a dyn MailSender,
    settings: &'a PublishSettings,
}

impl<'a> Publisher<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        mailer: &'a dyn MailSender,
        settings: &'a PublishSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    /// Upload the report, then email it. An upload failure aborts before any email is sent.
    pub async fn publish(
        &self,
        xlsx: Vec<u8>,
        yesterday_summary: &DailySummary,
        today_summary: &DailySummary,
        yesterday: NaiveDate,
        today: NaiveDate,
        step_timings: &mut StepTimings,
    ) -> Result<PublishOutcome> {
        let span = info_span!("upload_report").entered();
        let upload_start = Instant::now();
        let s3_location = self.upload(xlsx.clone(), today).await?;
        step_timings.upload = upload_start.elapsed().as_secs_f64();
        info!(
            duration_seconds = step_timings.upload,
            s3_location = %s3_location,
            "Report saved to S3"
        );
        drop(span);

        let span = info_span!("send_email").entered();
        let email_start = Instant::now();
        let message_id = self
            .send(xlsx, yesterday_summary, today_summary, yesterday, today)
            .await?;
        step_timings.email = email_start.elapsed().as_secs_f64();
        info!(
            duration_seconds = step_timings.email,
            message_id = %message_id,
            "Report email sent"
        );
        drop(span);

        Ok(PublishOutcome {
            s3_location,
            message_id,
        })
    }

    async fn upload(&self, xlsx: Vec<u8>, today: NaiveDate) -> Result<String> {
        let key = report_key(today);
        let size_bytes = xlsx.len();

        info!(
            bucket = %self.settings.bucket,
            key = %key,
            size_bytes,
            "Uploading report to S3"
        );

        self.store
            .put(&self.settings.bucket, &key, xlsx, XLSX_CONTENT_TYPE)
            .await
            .map_err(|e| ReportError::Storage(format!("{:#}", e)))
            .with_context(|| format!("Failed to upload s3://{}/{}", self.settings.bucket, key))?;

        Ok(format!("s3://{}/{}", self.settings.bucket, key))
    }

    async fn send(
        &self,
        xlsx: Vec<u8>,
        yesterday_summary: &DailySummary,
        today_summary: &DailySummary,
        yesterday: NaiveDate,
        today: NaiveDate,
    ) -> Result<String> {
        let message = EmailMessage {
            from: self.settings.from.clone(),
            to: self.settings.to.clone(),
            cc: self.settings.cc.clone(),
            subject: email::subject(&self.settings.subject_prefix, today),
            html_body: email::render_body(
                yesterday_summary,
                today_summary,
                yesterday,
                today,
                &self.settings.signature,
            ),
            attachment: Attachment {
                filename: report_filename(today),
                content_type: XLSX_CONTENT_TYPE.to_string(),
                data: xlsx,
            },
        };

        let now = Utc::now();
        let boundary = format!("backup-report-{}", now.timestamp_nanos_opt().unwrap_or_default());
        let raw = message.to_mime(&boundary, now);
        let destinations = message.destinations();

        info!(
            from = %message.from,
            to_count = message.to.len(),
            cc_count = message.cc.len(),
            size_bytes = raw.len(),
            "Sending report email"
        );

        match self.mailer.send_raw(&message.from, &destinations, raw).await {
            Ok(message_id) => Ok(message_id),
            Err(e) => {
                error!(
                    error = %format!("{:#}", e),
                    destinations = ?destinations,
                    "Error sending report email"
                );
                Err(ReportError::EmailSend(format!("{:#}", e)))
                    .context("Failed to send report email")
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct StoredObject {
        pub bucket: String,
        pub key: String,
        pub body: Vec<u8>,
        pub content_type: String,
    }

    #[derive(Default)]
    pub struct FakeStore {
        pub fail: bool,
        pub objects: Mutex<Vec<StoredObject>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<()> {
            if self.fail {
                return Err(anyhow!("AccessDenied: s3:PutObject"));
            }
            self.objects.lock().unwrap().push(StoredObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
                content_type: content_type.to_string(),
            });
            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    pub struct SentMail {
        pub source: String,
        pub destinations: Vec<String>,
        pub raw: String,
    }

    #[derive(Default)]
    pub struct FakeMailer {
        pub fail: bool,
        pub sent: Mutex<Vec<SentMail>>,
    }

    #[async_trait]
    impl MailSender for FakeMailer {
        async fn send_raw(
            &self,
            source: &str,
            destinations: &[String],
            raw: Vec<u8>,
        ) -> Result<String> {
            if self.fail {
                return Err(anyhow!("MessageRejected: Email address is not verified"));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(SentMail {
                source: source.to_string(),
                destinations: destinations.to_vec(),
                raw: String::from_utf8_lossy(&raw).into_owned(),
            });
            Ok(format!("msg-{}", sent.len()))
        }
    }

    pub fn settings() -> PublishSettings {
        PublishSettings {
            bucket: "backup-reports".to_string(),
            from: "reports@example.com".to_string(),
            to: vec!["ops@example.com".to_string()],
            cc: vec!["audit@example.com".to_string()],
            subject_prefix: "Reporte de Backups AWS".to_string(),
            signature: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeMailer, FakeStore, settings};
    use super::*;

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        )
    }

    #[test]
    fn test_report_key_partitioned_by_month() {
        let (_, today) = dates();
        assert_eq!(
            report_key(today),
            "reports/2026/10/backup-report-2026-10-16.xlsx"
        );
        let january = NaiveDate::from_ymd_opt(2027, 1, 3).unwrap();
        assert_eq!(
            report_key(january),
            "reports/2027/01/backup-report-2027-01-03.xlsx"
        );
    }

    #[tokio::test]
    async fn test_publish_uploads_then_sends() {
        let store = FakeStore::default();
        let mailer = FakeMailer::default();
        let settings = settings();
        let publisher = Publisher::new(&store, &mailer, &settings);
        let (yesterday, today) = dates();
        let mut timings = StepTimings::default();

        let outcome = publisher
            .publish(
                b"PK-fake".to_vec(),
                &DailySummary::default(),
                &DailySummary::default(),
                yesterday,
                today,
                &mut timings,
            )
            .await
            .unwrap();

        assert_eq!(
            outcome.s3_location,
            "s3://backup-reports/reports/2026/10/backup-report-2026-10-16.xlsx"
        );
        assert_eq!(outcome.message_id, "msg-1");

        let objects = store.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].bucket, "backup-reports");
        assert_eq!(objects[0].body, b"PK-fake");
        assert_eq!(objects[0].content_type, XLSX_CONTENT_TYPE);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].source, "reports@example.com");
        assert_eq!(sent[0].destinations, vec!["ops@example.com", "audit@example.com"]);
        assert!(sent[0].raw.contains("filename=\"backup-report-2026-10-16.xlsx\""));
    }

    #[tokio::test]
    async fn test_storage_failure_skips_email() {
        let store = FakeStore {
            fail: true,
            ..Default::default()
        };
        let mailer = FakeMailer::default();
        let settings = settings();
        let publisher = Publisher::new(&store, &mailer, &settings);
        let (yesterday, today) = dates();

        let err = publisher
            .publish(
                Vec::new(),
                &DailySummary::default(),
                &DailySummary::default(),
                yesterday,
                today,
                &mut StepTimings::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::Storage(_))
        ));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_propagates_after_upload() {
        let store = FakeStore::default();
        let mailer = FakeMailer {
            fail: true,
            ..Default::default()
        };
        let settings = settings();
        let publisher = Publisher::new(&store, &mailer, &settings);
        let (yesterday, today) = dates();

        let err = publisher
            .publish(
                Vec::new(),
                &DailySummary::default(),
                &DailySummary::default(),
                yesterday,
                today,
                &mut StepTimings::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::EmailSend(_))
        ));
        assert_eq!(store.objects.lock().unwrap().len(), 1);
    }
}
