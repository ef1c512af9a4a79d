//! Field-level validation shared by all input models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, AppResult};

/// A single field/message pair reported back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Inputs that must be checked before anything is persisted.
///
/// Each implementor returns every violated rule at once: the attribute rules
/// declared with `validator` plus any cross-field rules of its own.
pub trait Validated {
    fn validation_errors(&self) -> Vec<FieldError>;

    fn ensure_valid(&self) -> AppResult<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// Run the derived `validator` rules and flatten them into field/message pairs,
/// sorted by field name so responses are deterministic.
pub fn attribute_errors<T: Validate>(input: &T) -> Vec<FieldError> {
    let Err(errors) = input.validate() else {
        return Vec::new();
    };
    flatten(&errors)
}

fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid ({})", field, e.code));
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Report `message` for a field that is empty once trimmed, unless the field
/// already has an error.
pub fn require_non_blank(errors: &mut Vec<FieldError>, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() && !errors.iter().any(|e| e.field == field) {
        errors.push(FieldError::new(field, message));
        errors.sort_by(|a, b| a.field.cmp(&b.field));
    }
}
