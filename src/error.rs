//! Error types for light clustering

use crate::backend::BackendError;
use thiserror::Error;

/// Light clustering error type
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Invalid cluster configuration: {0}")]
    InvalidConfig(String),
    #[error("Upload failed: {0}")]
    Backend(#[from] BackendError),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
