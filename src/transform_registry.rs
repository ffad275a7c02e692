//! Transform registry for predictor parsing functions.
//!
//! The annotation schema refers to field transforms by name. A transform takes
//! one text value and produces one or more output values, which the
//! normalizer writes to the output columns named in the schema.

use crate::predictors;
use std::collections::HashMap;
use std::fmt;

/// Error type for transform operations
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    NotFound(String),
    InvalidArgs(String),
    ExecutionError(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NotFound(name) => write!(f, "Transform not found: {}", name),
            TransformError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            TransformError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}

/// Trait for transformation functions
pub trait TransformFn: Send + Sync {
    /// Execute the transformation on a single field value
    ///
    /// # Returns
    ///
    /// * `Ok(outputs)` - One value per output column
    /// * `Err(TransformError)` - Execution failed
    fn execute(&self, value: &str) -> Result<Vec<String>, TransformError>;

    /// Number of values `execute` produces
    fn arity(&self) -> usize;
}

/// Function-based implementation of TransformFn with a fixed arity
pub struct FnTransform<F> {
    func: F,
    arity: usize,
}

impl<F> FnTransform<F>
where
    F: Fn(&str) -> Result<Vec<String>, TransformError> + Send + Sync,
{
    pub fn new(arity: usize, func: F) -> Self {
        Self { func, arity }
    }
}

impl<F> TransformFn for FnTransform<F>
where
    F: Fn(&str) -> Result<Vec<String>, TransformError> + Send + Sync,
{
    fn execute(&self, value: &str) -> Result<Vec<String>, TransformError> {
        (self.func)(value)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

/// Registry for storing and calling transformation functions
pub struct TransformRegistry {
    transforms: HashMap<String, Box<dyn TransformFn>>,
}

impl TransformRegistry {
    /// Create a new empty transform registry
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Registry preloaded with the predictor parsers
    ///
    /// * `split_label_score` - `tolerated(0.24)` -> `[tolerated, 0.24]`
    /// * `max_score` - `0.1,.,0.9` -> `[0.9]`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(
            "split_label_score",
            Box::new(FnTransform::new(2, |value: &str| {
                let (label, score) = predictors::split_label_score(value);
                Ok(vec![label, score])
            })),
        );

        registry.register(
            "max_score",
            Box::new(FnTransform::new(1, |value: &str| {
                Ok(vec![predictors::format_score(predictors::max_score(value))])
            })),
        );

        registry
    }

    /// Register a transformation function
    pub fn register(&mut self, name: impl Into<String>, func: Box<dyn TransformFn>) {
        self.transforms.insert(name.into(), func);
    }

    /// Call a registered transformation function
    ///
    /// Fails if the transform is unknown or returns a different number of
    /// values than its declared arity.
    pub fn call(&self, name: &str, value: &str) -> Result<Vec<String>, TransformError> {
        let transform = self
            .transforms
            .get(name)
            .ok_or_else(|| TransformError::NotFound(name.to_string()))?;

        let outputs = transform.execute(value)?;
        if outputs.len() != transform.arity() {
            return Err(TransformError::ExecutionError(format!(
                "'{}' returned {} values, expected {}",
                name,
                outputs.len(),
                transform.arity()
            )));
        }

        Ok(outputs)
    }

    /// Declared number of outputs of a registered transform
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.transforms.get(name).map(|t| t.arity())
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
