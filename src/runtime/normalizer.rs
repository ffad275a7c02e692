//! Annotation normalizer.
//!
//! Turns a raw VEP table into the normalized annotation table. Per row:
//! 1. Unpack the `Extra` column and copy each schema field into the row
//!    (absent keys become `NA`)
//! 2. Apply renames
//! 3. Run predictor transforms in schema order
//! 4. Project onto the schema's output columns, filling gaps with `NA`

use crate::extraction::{ExtraFields, Extractor};
use crate::runtime::config_loader::AnnotationSchema;
use crate::runtime::PipelineError;
use crate::table::{Row, Table};
use crate::transform_registry::{TransformError, TransformRegistry};

pub struct AnnotationNormalizer {
    schema: AnnotationSchema,
    registry: TransformRegistry,
}

impl AnnotationNormalizer {
    /// Create a normalizer using the built-in predictor transforms.
    pub fn new(schema: AnnotationSchema) -> Result<Self, PipelineError> {
        Self::with_registry(schema, TransformRegistry::with_builtins())
    }

    /// Create a normalizer with a custom transform registry.
    pub fn with_registry(
        schema: AnnotationSchema,
        registry: TransformRegistry,
    ) -> Result<Self, PipelineError> {
        schema.validate(&registry).map_err(PipelineError::Schema)?;
        Ok(Self { schema, registry })
    }

    /// Normalize a whole raw annotation table.
    ///
    /// # Errors
    /// Fails if the packed column is absent or a transform fails
    pub fn normalize(&self, raw: &Table) -> Result<Table, PipelineError> {
        raw.require_columns(&[self.schema.extra_column.as_str()], "annotation table")?;

        let mut normalized = Table::new(self.schema.columns.clone());
        for row in raw.rows() {
            normalized.push_row(self.normalize_row(row)?);
        }

        tracing::debug!(
            "Normalized {} annotation rows into {} columns",
            normalized.len(),
            normalized.columns().len()
        );

        Ok(normalized)
    }

    /// Normalize one raw row. The result is not yet projected.
    pub fn normalize_row(&self, raw: &Row) -> Result<Row, TransformError> {
        let extra = ExtraFields::from_cell(raw.get(&self.schema.extra_column));
        let mut row = raw.clone();

        for field in &self.schema.extra_fields {
            row.set(field.clone(), extra.extract_or_na(field));
        }

        for (from, to) in &self.schema.renames {
            if let Some(value) = row.remove(from) {
                row.set(to.clone(), value);
            }
        }

        for step in &self.schema.transforms {
            let input = row.extract_or_na(&step.source);
            let outputs = self.registry.call(&step.transform, &input)?;

            if outputs.len() != step.outputs.len() {
                return Err(TransformError::InvalidArgs(format!(
                    "'{}' on '{}' gave {} values for {} output columns",
                    step.transform,
                    step.source,
                    outputs.len(),
                    step.outputs.len()
                )));
            }

            for (column, value) in step.outputs.iter().zip(outputs) {
                row.set(column.clone(), value);
            }
        }

        Ok(row)
    }
}

impl Default for AnnotationNormalizer {
    fn default() -> Self {
        Self {
            schema: AnnotationSchema::default(),
            registry: TransformRegistry::with_builtins(),
        }
    }
}
