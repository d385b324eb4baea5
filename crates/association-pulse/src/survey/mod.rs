//! Survey export import: `Question Code,Answer[,Submitted At]` CSV to a `Submission`.

mod parser;

use chrono::Utc;
use std::io::Read;
use std::path::Path;

use crate::scoring::{OrganizationId, ResponseSet, Submission};

#[derive(Debug)]
pub enum SurveyImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SurveyImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyImportError::Io(err) => write!(f, "failed to read survey export: {}", err),
            SurveyImportError::Csv(err) => write!(f, "invalid survey CSV data: {}", err),
        }
    }
}

impl std::error::Error for SurveyImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurveyImportError::Io(err) => Some(err),
            SurveyImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SurveyImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SurveyImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct SurveyImporter;

impl SurveyImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        organization_id: OrganizationId,
    ) -> Result<Submission, SurveyImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, organization_id)
    }

    /// Blank answers are skipped and a repeated code keeps its last answer.
    /// The latest `Submitted At` becomes the submission timestamp.
    pub fn from_reader<R: Read>(
        reader: R,
        organization_id: OrganizationId,
    ) -> Result<Submission, SurveyImportError> {
        let records = parser::parse_records(reader)?;

        let mut responses = ResponseSet::new();
        let mut latest = None;
        for record in records {
            if let Some(submitted_at) = record.submitted_at {
                latest = latest.max(Some(submitted_at));
            }
            if let Some(answer) = record.answer {
                responses.insert(record.question_code, answer);
            }
        }

        tracing::debug!(
            organization_id = %organization_id,
            responses = responses.len(),
            "survey export imported"
        );

        Ok(Submission {
            organization_id,
            responses,
            timestamp: latest.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn import_builds_submission_with_latest_timestamp() {
        let csv = "\
Question Code,Answer,Submitted At
FI.LQ.001,Yes,2024-02-01
FI.LQ.002,No,2024-02-03T09:00:00Z
FI.LQ.002,Yes,
ZZ.UNKNOWN.001,Yes,
OP.SR.001,,2024-01-15
";
        let submission =
            SurveyImporter::from_reader(csv.as_bytes(), OrganizationId::new("ymca-csv"))
                .expect("imports");

        assert_eq!(submission.organization_id.as_str(), "ymca-csv");
        assert_eq!(submission.responses.answer("FI.LQ.002"), Some("Yes"));
        assert_eq!(submission.responses.answer("ZZ.UNKNOWN.001"), Some("Yes"));
        assert_eq!(submission.responses.answer("OP.SR.001"), None);
        assert_eq!(submission.responses.len(), 3);
        assert_eq!(
            Some(submission.timestamp),
            Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).single()
        );
    }

    #[test]
    fn missing_required_column_is_a_csv_error() {
        let csv = "Code,Value\nFI.LQ.001,Yes\n";
        let error = SurveyImporter::from_reader(csv.as_bytes(), OrganizationId::new("x"))
            .expect_err("missing headers");
        assert!(matches!(error, SurveyImportError::Csv(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = SurveyImporter::from_path(
            "/definitely/not/here/survey.csv",
            OrganizationId::new("x"),
        )
        .expect_err("missing file");
        assert!(matches!(error, SurveyImportError::Io(_)));
    }
}
