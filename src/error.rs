use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Backup job listing failed: {0}")]
    JobListing(String),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Report upload failed: {0}")]
    Storage(String),

    #[error("Email delivery failed: {0}")]
    EmailSend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ReportError::Storage("AccessDenied".to_string()).to_string(),
            "Report upload failed: AccessDenied"
        );
        assert_eq!(
            ReportError::EmailSend("MessageRejected".to_string()).to_string(),
            "Email delivery failed: MessageRejected"
        );
    }
}
