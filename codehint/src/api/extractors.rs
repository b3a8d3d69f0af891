use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{CodehintError, FieldError};

/// `axum::Json` with rejections mapped into the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(CodehintError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for CodehintError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> CodehintError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let (field, message) = locate_data_error(&err.body_text());
            CodehintError::validation(field, message)
        }
        JsonRejection::JsonSyntaxError(err) => {
            CodehintError::BadRequest(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => CodehintError::BadRequest(
            "Missing `Content-Type: application/json` header".to_string(),
        ),
        JsonRejection::BytesRejection(err) => {
            CodehintError::BadRequest(format!("Failed to read request body: {}", err.body_text()))
        }
        other => CodehintError::BadRequest(other.body_text()),
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Split a serde data error into `(field path, message)`.
///
/// axum reports `path: message`, with the path omitted for root-level
/// errors. A missing field is appended to the path it was missing from.
fn locate_data_error(text: &str) -> (String, String) {
    let text = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    let (path, message) = match text.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(' ') => (path, message),
        _ => ("", text),
    };
    let message = strip_position(message);

    let field = match extract_missing_field(message) {
        Some(missing) if path.is_empty() => missing.to_string(),
        Some(missing) => format!("{path}.{missing}"),
        None if path.is_empty() => "body".to_string(),
        None => path.to_string(),
    };
    (field, message.to_string())
}

fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(idx) => &message[..idx],
        None => message,
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

/// JSON body that must also pass its `validator` rules.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Validate + serde::de::DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CodehintError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;
        value.validate().map_err(validation_error)?;
        Ok(Self(value))
    }
}

fn validation_error(errors: ValidationErrors) -> CodehintError {
    let mut fields = Vec::new();
    flatten_errors(None, &errors, &mut fields);
    fields.sort_by(|a, b| a.field.cmp(&b.field));

    let message = fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ");
    CodehintError::Validation { message, fields }
}

fn flatten_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (name, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed `{}` check", error.code));
                    FieldError::new(path.clone(), message)
                }));
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_errors(Some(&format!("{path}[{index}]")), inner, out);
                }
            }
        }
    }
}
