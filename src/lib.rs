//! # varmerge: clinical variant / VEP annotation reconciliation
//!
//! varmerge joins a clinical-significance variant table (e.g. ClinVar) to
//! Ensembl VEP transcript-level annotations for one gene.
//!
//! ## Features
//!
//! - **Annotation normalizer**: unpacks the VEP `Extra` column into fixed,
//!   named columns, splits `label(score)` predictions and reduces
//!   multi-transcript score lists
//! - **Variant matcher**: attaches the best annotation row to every clinical
//!   record through a cascade of exact key comparisons, logging the records
//!   that find none
//! - **Configurable schema**: the extracted fields, renames, predictor
//!   transforms and output columns are defined in YAML
//! - **VCF emitter**: writes a minimal VCF body from the clinical table
//!
//! ## Example: annotation schema
//!
//! ```yaml
//! schema:
//!   extra_column: Extra
//!   extra_fields: [SYMBOL, SIFT, REVEL]
//!   renames:
//!     SYMBOL: GeneSymbol
//!     REVEL: REVEL_score
//!   transforms:
//!     - transform: split_label_score
//!       source: SIFT
//!       outputs: [SIFT_label, SIFT_score]
//!   columns: [Feature, Existing_variation, Codons, GeneSymbol, SIFT_label, SIFT_score, REVEL_score]
//! ```

// Core modules
pub mod table;
pub mod extraction;
pub mod predictors;
pub mod transform_registry;
pub mod reader;
pub mod serialization;
pub mod vcf;

// Normalizer and matcher pipelines
pub mod runtime;

// Re-export key types
pub use table::{filter_by_gene, is_missing, Row, Table, TableError, NA};
pub use extraction::{Extractor, ExtraFields};
pub use transform_registry::{TransformRegistry, TransformError, TransformFn, FnTransform};
pub use reader::{read_csv, read_vep, VEP_HEADER_MARKER};
pub use serialization::{write_table, write_table_to_path, OutputFormat, SerializationError};

// Re-export runtime types
pub use runtime::{
    AnnotationNormalizer, AnnotationSchema, MatchReport, MatchStats, PipelineError,
    UnmatchedLog, VariantMatcher,
};
