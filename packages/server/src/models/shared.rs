use serde::Serialize;

/// Maximum title length, in Unicode characters.
pub const MAX_TITLE_CHARS: usize = 256;

/// A field-level error shown next to the form input named by `field`.
/// An empty `field` marks an error that belongs to the form as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ModelError {
    #[schema(example = "blog.title")]
    pub field: String,
    #[schema(example = "Title is required.")]
    pub message: String,
}

/// Errors collected while validating a submitted form.
#[derive(Debug, Default)]
pub struct ModelState {
    errors: Vec<ModelError>,
}

impl ModelState {
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ModelError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ModelError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ModelError> {
        self.errors
    }
}

/// Record `message` against `field` when `value` is blank.
pub fn require(state: &mut ModelState, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        state.add_error(field, message);
    }
}

/// Validate a title: required, at most [`MAX_TITLE_CHARS`] characters once trimmed.
pub fn validate_title(state: &mut ModelState, field: &str, title: &str) {
    let title = title.trim();
    if title.is_empty() {
        state.add_error(field, "Title is required.");
    } else if title.chars().count() > MAX_TITLE_CHARS {
        state.add_error(
            field,
            format!("Title must be at most {MAX_TITLE_CHARS} characters."),
        );
    }
}
