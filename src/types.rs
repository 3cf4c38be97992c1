use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One AWS Backup job as returned by ListBackupJobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupJobRecord {
    pub backup_job_id: Option<String>,
    pub account_id: Option<String>,
    pub state: Option<String>,
    pub resource_arn: Option<String>,
    pub resource_name: Option<String>,
    pub resource_type: Option<String>,
    pub status_message: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

impl BackupJobRecord {
    pub fn bucket(&self) -> StateBucket {
        StateBucket::from_state(self.state.as_deref())
    }

    /// UTC calendar day the job was created on.
    pub fn creation_day(&self) -> Option<NaiveDate> {
        self.creation_date.map(|ts| ts.date_naive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBucket {
    Completed,
    Failed,
    Other,
}

impl StateBucket {
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some("COMPLETED") => Self::Completed,
            Some("FAILED") => Self::Failed,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub completed: u32,
    pub failed: u32,
    pub other: u32,
}

impl StateCounts {
    pub fn increment(&mut self, bucket: StateBucket) {
        match bucket {
            StateBucket::Completed => self.completed += 1,
            StateBucket::Failed => self.failed += 1,
            StateBucket::Other => self.other += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.completed + self.failed + self.other
    }
}

/// Per-account counts for one day, iterated in ascending account-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailySummary {
    accounts: BTreeMap<String, StateCounts>,
}

impl DailySummary {
    pub fn record(&mut self, account_name: &str, bucket: StateBucket) {
        self.accounts
            .entry(account_name.to_string())
            .or_default()
            .increment(bucket);
    }

    pub fn get(&self, account_name: &str) -> Option<&StateCounts> {
        self.accounts.get(account_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateCounts)> {
        self.accounts.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn totals(&self) -> StateCounts {
        self.accounts
            .values()
            .fold(StateCounts::default(), |acc, c| StateCounts {
                completed: acc.completed + c.completed,
                failed: acc.failed + c.failed,
                other: acc.other + c.other,
            })
    }
}

/// Printed to stdout at the end of a successful run.
#[derive(Debug, Serialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: InvocationBody,
    pub step_timings: StepTimings,
}

#[derive(Debug, Serialize)]
pub struct InvocationBody {
    pub message: String,
    pub s3_location: String,
    pub yesterday_jobs: usize,
    pub today_jobs: usize,
}

#[derive(Debug, Serialize, Default)]
pub struct StepTimings {
    pub fetch: f64,
    pub aggregate: f64,
    pub render: f64,
    pub upload: f64,
    pub email: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_state_bucket_exact_match() {
        assert_eq!(StateBucket::from_state(Some("COMPLETED")), StateBucket::Completed);
        assert_eq!(StateBucket::from_state(Some("FAILED")), StateBucket::Failed);
        assert_eq!(StateBucket::from_state(Some("completed")), StateBucket::Other);
        assert_eq!(StateBucket::from_state(Some("RUNNING")), StateBucket::Other);
        assert_eq!(StateBucket::from_state(None), StateBucket::Other);
    }

    #[test]
    fn test_summary_iterates_sorted() {
        let mut summary = DailySummary::default();
        summary.record("Zeta", StateBucket::Completed);
        summary.record("Alpha", StateBucket::Failed);
        summary.record("Mid", StateBucket::Other);

        let names: Vec<&str> = summary.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
        assert_eq!(summary.totals().total(), 3);
    }

    #[test]
    fn test_creation_day_is_utc_date() {
        let record = BackupJobRecord {
            creation_date: Some(Utc.with_ymd_and_hms(2026, 10, 15, 23, 59, 59).unwrap()),
            ..Default::default()
        };
        assert_eq!(
            record.creation_day(),
            NaiveDate::from_ymd_opt(2026, 10, 15)
        );
    }

    #[test]
    fn test_invocation_result_json_shape() {
        let result = InvocationResult {
            status_code: 200,
            body: InvocationBody {
                message: "ok".to_string(),
                s3_location: "s3://bucket/key".to_string(),
                yesterday_jobs: 2,
                today_jobs: 0,
            },
            step_timings: StepTimings::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"]["yesterday_jobs"], 2);
        assert_eq!(json["body"]["today_jobs"], 0);
    }
}
