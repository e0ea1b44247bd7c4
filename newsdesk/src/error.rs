//! Error types for newsletter generation.

use std::fmt;
use thiserror::Error;

use crate::agent::ModelTier;

/// Startup configuration errors. Fatal, never recovered.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A required credential env var is missing or empty
    #[error("{var} is not set")]
    MissingCredential { var: String },
}

/// Raised by an agent factory when a tier cannot be wired up
#[derive(Error, Debug)]
#[error("failed to construct {tier} agent ({model}): {source:#}")]
pub struct AgentConstructionError {
    pub tier: ModelTier,
    pub model: String,
    pub source: anyhow::Error,
}

/// What went wrong while the agent was running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Model, tool or transport failure
    Runtime,
    /// The run exceeded its time budget
    Timeout,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationErrorKind::Runtime => f.write_str("runtime failure"),
            GenerationErrorKind::Timeout => f.write_str("timeout"),
        }
    }
}

/// Flat discriminant of [`NewsletterError`], for callers that only branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidRequest,
    AgentConstruction,
    Generation,
}

/// Failure half of a newsletter result
#[derive(Error, Debug)]
pub enum NewsletterError {
    #[error("invalid newsletter request: {0}")]
    InvalidRequest(String),

    /// Both tiers failed to construct
    #[error("no research agent available; primary: {primary}; fallback: {fallback}")]
    AgentConstruction {
        primary: AgentConstructionError,
        #[source]
        fallback: AgentConstructionError,
    },

    /// The agent ran but did not deliver
    #[error("newsletter generation failed on {tier} tier ({kind}): {source:#}")]
    Generation {
        kind: GenerationErrorKind,
        tier: ModelTier,
        source: anyhow::Error,
    },
}

impl NewsletterError {
    pub fn kind(&self) -> FailureKind {
        match self {
            NewsletterError::InvalidRequest(_) => FailureKind::InvalidRequest,
            NewsletterError::AgentConstruction { .. } => FailureKind::AgentConstruction,
            NewsletterError::Generation { .. } => FailureKind::Generation,
        }
    }
}
