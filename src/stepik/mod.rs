#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Stepik connector: REST client, payload shapes, step option migrations and
//! the loader that brings a student's submitted solutions into a course.

/// Authorized and anonymous REST access.
pub mod client;
/// Step options and reply migrations.
pub mod options;
/// Placeholder tags of old submissions.
pub mod parsers;
/// Loading submitted solutions into a course.
pub mod solutions;
/// Small helpers over courses loaded from Stepik.
pub mod utils;
/// API payloads.
pub mod wrappers;

pub use client::{StepikAccount, StepikClient};
pub use solutions::{
    FsSolutionSink, SolutionSink, SolutionSource, SolutionsLoader, SyncReport, TaskSolutions,
};

use crate::{auth::AuthError, format::FormatError};

/// Failures talking to Stepik or reading what it returned.
#[derive(thiserror::Error, Debug)]
pub enum StepikError {
    /// Stepik answered with a status other than 200.
    #[error("Stepik returned non 200 status code {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body:   String,
    },
    /// The response parsed but made no sense.
    #[error("malformed Stepik response: {0}")]
    Malformed(String),
    /// The response is not the JSON it should be.
    #[error("malformed Stepik JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// An embedded course document could not be read.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Logging in or refreshing tokens failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Transport failure.
    #[error("Connection failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Any other failure.
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}
