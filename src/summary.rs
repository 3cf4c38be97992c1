use crate::directory::AccountDirectory;
use crate::types::{BackupJobRecord, DailySummary};

/// Count jobs per account display name and state bucket.
pub async fn aggregate(
    records: &[BackupJobRecord],
    directory: &mut AccountDirectory<'_>,
) -> DailySummary {
    let mut summary = DailySummary::default();

    for record in records {
        let account_name = directory.display_name(record.account_id.as_deref()).await;
        summary.record(&account_name, record.bucket());
    }

    summary
}
