//! Error kinds raised by the controller pipeline

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControllerError {
    /// Rejected at startup, before any sample is processed
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("classifier used before being fitted")]
    ClassifierNotFitted,
}

impl ControllerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ControllerError::InvalidConfiguration(message.into())
    }
}
