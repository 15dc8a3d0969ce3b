//! Clean-up of request fields before they reach the ORM.
//!
//! Strings are trimmed, blank optional strings become `None`, and taxpayer
//! documents are validated and stored as bare digits. Every function returns
//! a message suitable for a 400 response on failure.

use std::str::FromStr;

use valida::{validate_cnpj, validate_document};

/// Trims a required text field, rejecting blank values.
pub fn required_text(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("Field '{}' cannot be blank", field));
    }
    Ok(trimmed.to_string())
}

/// Same as [`required_text`] for a field that may be absent (partial updates).
pub fn changed_text(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    value.map(|v| required_text(field, &v)).transpose()
}

/// Trims an optional text field. Blank input is treated as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Validates an optional CPF or CNPJ and returns its digits.
pub fn optional_document(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    match optional_text(value) {
        Some(raw) => validate_document(&raw)
            .map(|doc| Some(doc.digits().to_string()))
            .map_err(|e| format!("Invalid {}: {}", field, e)),
        None => Ok(None),
    }
}

/// Validates an optional CNPJ and returns its digits.
pub fn optional_cnpj(value: Option<String>) -> Result<Option<String>, String> {
    match optional_text(value) {
        Some(raw) => validate_cnpj(&raw)
            .map(|cnpj| Some(cnpj.digits().to_string()))
            .map_err(|e| format!("Invalid cnpj: {}", e)),
        None => Ok(None),
    }
}

/// Parses an optional enum given as text, e.g. a status filter.
pub fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr<Err = String>,
{
    value.map(|v| v.trim().parse::<T>()).transpose()
}

/// Lowercases and trims an email address, requiring a local part and a
/// domain.
pub fn normalize_email(value: &str) -> Result<String, String> {
    let email = value.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(format!("Invalid email address '{}'", value.trim())),
    }
}
