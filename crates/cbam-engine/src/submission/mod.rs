//! Batch-level submission readiness and the HTTP surface over the engine.

mod domain;
mod orchestrator;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    quarter_deadline, BatchIssue, CertificateBalance, EntryReadiness, ReadinessScores,
    SubmissionReadiness, SubmissionReport, VerificationCoverage, READY_READINESS_SCORE,
};
pub use orchestrator::{
    validate_for_submission, validate_for_submission_concurrent, SubmissionError,
};
pub use router::compliance_router;
pub use service::ComplianceService;
