use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// The programming problem the user is looking at, as scraped by the
/// extension. Supplied with every request; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct ProblemContext {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    /// `Easy`, `Medium` or `Hard` on LeetCode; passed through verbatim.
    pub difficulty: String,
    pub description: String,
    /// Problem slug or numeric id from the page URL.
    pub id: String,
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}
