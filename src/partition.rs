use chrono::NaiveDate;
use tracing::{debug, info};

use crate::types::BackupJobRecord;

#[derive(Debug, Default)]
pub struct DayPartition {
    pub yesterday: Vec<BackupJobRecord>,
    pub today: Vec<BackupJobRecord>,
    pub dropped: usize,
}

/// Split records by exact UTC creation date. Records created on any other day,
/// or without a creation date, are dropped.
pub fn partition(
    records: Vec<BackupJobRecord>,
    today: NaiveDate,
    yesterday: NaiveDate,
) -> DayPartition {
    let mut result = DayPartition::default();

    for record in records {
        match record.creation_day() {
            Some(day) if day == yesterday => result.yesterday.push(record),
            Some(day) if day == today => result.today.push(record),
            day => {
                debug!(
                    backup_job_id = record.backup_job_id.as_deref().unwrap_or("-"),
                    creation_day = ?day,
                    "Backup job outside report days, skipping"
                );
                result.dropped += 1;
            }
        }
    }

    info!(
        %yesterday,
        %today,
        yesterday_jobs = result.yesterday.len(),
        today_jobs = result.today.len(),
        dropped = result.dropped,
        "Backup jobs partitioned by day"
    );

    result
}
