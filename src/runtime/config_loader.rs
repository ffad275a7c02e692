//! Annotation schema loader.
//!
//! The schema describes how a raw VEP table becomes the normalized annotation
//! table: which keys to pull out of the packed `Extra` column, how to rename
//! them, which predictor transforms to run, and the final column order.

use crate::transform_registry::TransformRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a schema file to use instead of the default.
pub const SCHEMA_ENV_VAR: &str = "VARMERGE_SCHEMA";

/// A named transform applied to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTransform {
    /// Registered transform name (e.g. `split_label_score`)
    pub transform: String,

    /// Input field, after renames
    pub source: String,

    /// Output columns, one per transform output; may include `source` itself
    pub outputs: Vec<String>,
}

/// Normalization schema for the annotation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSchema {
    /// Name of the packed key-value column
    #[serde(default = "default_extra_column")]
    pub extra_column: String,

    /// Keys looked up in the packed column; absent keys become `NA`
    pub extra_fields: Vec<String>,

    /// Column renames, applied after extraction
    #[serde(default)]
    pub renames: IndexMap<String, String>,

    /// Predictor transforms, applied in order after renames
    #[serde(default)]
    pub transforms: Vec<FieldTransform>,

    /// Output columns, in order
    pub columns: Vec<String>,
}

fn default_extra_column() -> String {
    "Extra".to_string()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for AnnotationSchema {
    fn default() -> Self {
        let extra_fields = strings(&[
            "SYMBOL",
            "HGNC_ID",
            "CANONICAL",
            "SWISSPROT",
            "UNIPARC",
            "UNIPROT_ISOFORM",
            "SIFT",
            "PolyPhen",
            "am_class",
            "am_pathogenicity",
            "BayesDel_addAF_pred",
            "BayesDel_addAF_score",
            "CADD_PHRED",
            "CADD_RAW",
            "ClinPred",
            "VEST4_rankscore",
            "VEST4_score",
            "EVE_CLASS",
            "EVE_SCORE",
            "PrimateAI",
            "REVEL",
        ]);

        let renames = [
            ("am_class", "AM_label"),
            ("am_pathogenicity", "AM_score"),
            ("BayesDel_addAF_pred", "BayesDel_label"),
            ("BayesDel_addAF_score", "BayesDel_score"),
            ("CADD_PHRED", "CADD_PHRED_score"),
            ("CADD_RAW", "CADD_RAW_score"),
            ("ClinPred", "ClinPred_score"),
            ("VEST4_rankscore", "VEST4_rankscore"),
            ("EVE_CLASS", "EVE_label"),
            ("EVE_SCORE", "EVE_score"),
            ("PrimateAI", "PrimateAI_score"),
            ("REVEL", "REVEL_score"),
            ("SYMBOL", "GeneSymbol"),
            ("CANONICAL", "Canonical"),
            ("SWISSPROT", "Swissprot"),
            ("UNIPARC", "Uniparc"),
            ("UNIPROT_ISOFORM", "Uniprot_isoform"),
        ]
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let transforms = vec![
            FieldTransform {
                transform: "split_label_score".to_string(),
                source: "SIFT".to_string(),
                outputs: strings(&["SIFT_label", "SIFT_score"]),
            },
            FieldTransform {
                transform: "split_label_score".to_string(),
                source: "PolyPhen".to_string(),
                outputs: strings(&["PolyPhen_label", "PolyPhen_score"]),
            },
            FieldTransform {
                transform: "max_score".to_string(),
                source: "VEST4_score".to_string(),
                outputs: strings(&["VEST4_score"]),
            },
        ];

        let columns = strings(&[
            "Existing_variation",
            "Location",
            "Gene",
            "Feature",
            "Feature_type",
            "Canonical",
            "Consequence",
            "Swissprot",
            "Uniparc",
            "Uniprot_isoform",
            "cDNA_position",
            "CDS_position",
            "Protein_position",
            "Amino_acids",
            "Codons",
            "GeneSymbol",
            "HGNC_ID",
            "SIFT_label",
            "SIFT_score",
            "PolyPhen_label",
            "PolyPhen_score",
            "BayesDel_label",
            "BayesDel_score",
            "CADD_PHRED_score",
            "CADD_RAW_score",
            "ClinPred_score",
            "VEST4_score",
            "VEST4_rankscore",
            "EVE_label",
            "EVE_score",
            "REVEL_score",
            "PrimateAI_score",
            "AM_label",
            "AM_score",
        ]);

        Self {
            extra_column: default_extra_column(),
            extra_fields,
            renames,
            transforms,
            columns,
        }
    }
}

impl AnnotationSchema {
    /// Load a schema from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid schema
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read schema file {}: {}", path.display(), e))?;

        Self::from_yaml_str(&contents)
            .map_err(|e| format!("Invalid schema file {}: {}", path.display(), e))
    }

    /// Parse a schema from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, String> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse YAML: {}", e))?;

        let schema_yaml = value
            .get("schema")
            .ok_or_else(|| "Schema YAML missing 'schema' field".to_string())?;

        serde_yaml::from_value(schema_yaml.clone())
            .map_err(|e| format!("Failed to parse schema definition: {}", e))
    }

    /// Serialize the schema as YAML, wrapped in a top-level `schema` key.
    pub fn to_yaml_string(&self) -> Result<String, String> {
        let mut root = IndexMap::new();
        root.insert("schema", self);
        serde_yaml::to_string(&root).map_err(|e| format!("Failed to serialize schema: {}", e))
    }

    /// Pick the schema for a run.
    ///
    /// Precedence: explicit path > `VARMERGE_SCHEMA` > built-in default.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = cli_path {
            tracing::info!("Using annotation schema from {}", path.display());
            return Self::load_from_file(path);
        }

        if let Ok(path) = std::env::var(SCHEMA_ENV_VAR) {
            if !path.is_empty() {
                let path = PathBuf::from(path);
                tracing::info!(
                    "Using annotation schema from {}: {}",
                    SCHEMA_ENV_VAR,
                    path.display()
                );
                return Self::load_from_file(&path);
            }
        }

        tracing::debug!("Using built-in annotation schema");
        Ok(Self::default())
    }

    /// Check the schema against a transform registry.
    ///
    /// Checks:
    /// - Projection is non-empty and has no duplicate columns
    /// - Every transform is registered and has as many outputs as it produces
    /// - Every transform source is produced by extraction, a rename, or an
    ///   earlier transform
    pub fn validate(&self, registry: &TransformRegistry) -> Result<(), String> {
        if self.columns.is_empty() {
            return Err("Schema declares no output columns".to_string());
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(format!("Duplicate output column '{}'", column));
            }
        }

        let mut produced: HashSet<String> = self
            .extra_fields
            .iter()
            .map(|field| self.renames.get(field).unwrap_or(field).clone())
            .collect();

        for step in &self.transforms {
            let arity = registry
                .arity(&step.transform)
                .ok_or_else(|| format!("Unknown transform '{}'", step.transform))?;

            if arity != step.outputs.len() {
                return Err(format!(
                    "Transform '{}' on '{}' produces {} values but {} outputs are named",
                    step.transform,
                    step.source,
                    arity,
                    step.outputs.len()
                ));
            }

            if !produced.contains(&step.source) {
                return Err(format!(
                    "Transform '{}' reads '{}', which no extracted field provides",
                    step.transform, step.source
                ));
            }

            produced.extend(step.outputs.iter().cloned());
        }

        Ok(())
    }
}
