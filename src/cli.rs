use clap::Parser;

use crate::error::ReportError;

/// Daily AWS Backup job report to S3 and email
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// S3 bucket name for storing the XLSX reports
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket_name: String,

    /// Sender address (must be verified in SES)
    #[arg(long, env = "FROM_EMAIL")]
    pub from_email: String,

    /// Comma-separated recipient addresses
    #[arg(long, env = "TO_EMAILS", value_delimiter = ',', required = true)]
    pub to_emails: Vec<String>,

    /// Comma-separated CC addresses
    #[arg(long, env = "CC_EMAILS", value_delimiter = ',')]
    pub cc_emails: Vec<String>,

    /// AWS region (default provider chain when unset)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Email subject prefix, the report date is appended
    #[arg(long, env = "EMAIL_SUBJECT_PREFIX", default_value = "Reporte de Backups AWS")]
    pub subject_prefix: String,

    /// Signature lines appended to the email body, separated by '|'
    #[arg(long, env = "EMAIL_SIGNATURE", value_delimiter = '|')]
    pub signature: Vec<String>,

    /// Log format: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn to_recipients(&self) -> Vec<String> {
        clean_addresses(&self.to_emails)
    }

    pub fn cc_recipients(&self) -> Vec<String> {
        clean_addresses(&self.cc_emails)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.bucket_name.trim().is_empty() {
            return Err(ReportError::Config("BUCKET_NAME must not be empty".to_string()));
        }

        if !looks_like_address(&self.from_email) {
            return Err(ReportError::Config(format!(
                "FROM_EMAIL is not a valid address: {}",
                self.from_email
            )));
        }

        let to = self.to_recipients();
        if to.is_empty() {
            return Err(ReportError::Config(
                "TO_EMAILS must contain at least one address".to_string(),
            ));
        }

        if let Some(bad) = to
            .iter()
            .chain(self.cc_recipients().iter())
            .find(|addr| !looks_like_address(addr))
        {
            return Err(ReportError::Config(format!(
                "Invalid recipient address: {}",
                bad
            )));
        }

        Ok(())
    }
}

fn clean_addresses(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn looks_like_address(addr: &str) -> bool {
    match addr.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "backup-report",
            "--bucket-name",
            "reports-bucket",
            "--from-email",
            "noreply@example.com",
            "--to-emails",
            "ops@example.com,lead@example.com",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_recipients_split_on_comma() {
        let args = parse(&[]);
        assert_eq!(
            args.to_recipients(),
            vec!["ops@example.com", "lead@example.com"]
        );
        assert!(args.cc_recipients().is_empty());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_cc_empty_entries_ignored() {
        let args = parse(&["--cc-emails", "audit@example.com, ,"]);
        assert_eq!(args.cc_recipients(), vec!["audit@example.com"]);
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.subject_prefix, "Reporte de Backups AWS");
        assert_eq!(args.log_format, "json");
        assert_eq!(args.log_level, "info");
        assert!(args.signature.is_empty());
    }

    #[test]
    fn test_signature_lines() {
        let args = parse(&["--signature", "Saludos,|Equipo Cloud"]);
        assert_eq!(args.signature, vec!["Saludos,", "Equipo Cloud"]);
    }

    #[test]
    fn test_validate_rejects_bad_recipient() {
        let args = parse(&["--cc-emails", "not-an-address"]);
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }

    #[test]
    fn test_validate_rejects_blank_to() {
        let mut args = parse(&[]);
        args.to_emails = vec![" ".to_string()];
        assert!(matches!(args.validate(), Err(ReportError::Config(_))));
    }

    #[test]
    fn test_missing_bucket_is_parse_error() {
        let result = Args::try_parse_from([
            "backup-report",
            "--from-email",
            "noreply@example.com",
            "--to-emails",
            "ops@example.com",
        ]);
        // BUCKET_NAME may be set in the environment running the tests
        if std::env::var("BUCKET_NAME").is_err() {
            assert!(result.is_err());
        }
    }
}
