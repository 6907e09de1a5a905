//! Typed failures the checker distinguishes between.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("results table did not appear within {0:?}")]
    ResultsTableTimeout(Duration),

    #[error("page did not finish loading within {0:?}")]
    PageLoadTimeout(Duration),

    #[error("email template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("email is not configured: {0}")]
    MailConfig(String),
}
