//! Batch pipelines over annotation and clinical tables.
//!
//! This module holds the two components with real decision logic: the
//! annotation normalizer and the cascading variant matcher, plus the schema
//! and log they rely on.

pub mod config_loader;
pub mod matcher;
pub mod normalizer;
pub mod unmatched_log;

use crate::serialization::SerializationError;
use crate::table::TableError;
use crate::transform_registry::TransformError;
use std::fmt;

// Re-export key types
pub use config_loader::{AnnotationSchema, FieldTransform, SCHEMA_ENV_VAR};
pub use matcher::{
    select_candidate, MatchKeys, MatchOutcome, MatchReport, MatchStage, MatchStats,
    VariantMatcher,
};
pub use normalizer::AnnotationNormalizer;
pub use unmatched_log::{UnmatchedLog, BANNER};

/// Error type for pipeline runs
#[derive(Debug)]
pub enum PipelineError {
    Table(TableError),
    Transform(TransformError),
    Serialization(SerializationError),
    Io(std::io::Error),
    Schema(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Table(e) => write!(f, "{}", e),
            PipelineError::Transform(e) => write!(f, "Transform failed: {}", e),
            PipelineError::Serialization(e) => write!(f, "Failed to write output: {}", e),
            PipelineError::Io(e) => write!(f, "IO error: {}", e),
            PipelineError::Schema(msg) => write!(f, "Invalid annotation schema: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<TableError> for PipelineError {
    fn from(err: TableError) -> Self {
        PipelineError::Table(err)
    }
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        PipelineError::Transform(err)
    }
}

impl From<SerializationError> for PipelineError {
    fn from(err: SerializationError) -> Self {
        PipelineError::Serialization(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}
