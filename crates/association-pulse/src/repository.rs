use crate::scoring::{OrganizationId, Submission};

/// Storage abstraction for survey submissions so the analysis service can be
/// exercised in isolation. Submissions are append-only.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError>;
    /// Submission with the greatest timestamp, if any.
    fn latest(&self, organization_id: &OrganizationId)
        -> Result<Option<Submission>, RepositoryError>;
    /// Every submission for the organization, oldest first.
    fn history(&self, organization_id: &OrganizationId) -> Result<Vec<Submission>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
