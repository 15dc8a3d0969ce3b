//! Unauthenticated validators used by the front end while a form is being
//! filled in. Both answer 200 and describe the result in the body.

use std::path::PathBuf;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::AppConfig;
use crate::rate_limit::RateLimited;

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentValidation {
    pub valid: bool,
    /// `cpf` or `cnpj` when valid.
    pub kind: Option<String>,
    pub digits: Option<String>,
    pub formatted: Option<String>,
    pub error: Option<String>,
}

impl DocumentValidation {
    pub fn check(input: &str) -> Self {
        match valida::validate_document(input) {
            Ok(document) => DocumentValidation {
                valid: true,
                kind: Some(document.kind().to_string()),
                digits: Some(document.digits().to_string()),
                formatted: Some(document.formatted()),
                error: None,
            },
            Err(e) => DocumentValidation {
                valid: false,
                kind: None,
                digits: None,
                formatted: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Deserialize, TS)]
#[ts(export)]
pub struct PasswordCheckRequest {
    #[serde(alias = "senha")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PasswordCheckResponse {
    pub min_length: bool,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digit: bool,
    pub symbol: bool,
    pub score: u8,
    /// `muito_fraca` through `muito_forte`.
    pub strength: String,
    pub acceptable: bool,
    pub min_score: u8,
    pub feedback: Vec<String>,
}

impl PasswordCheckResponse {
    pub fn check(password: &str, min_score: u8) -> Self {
        let report = valida::evaluate_password(password);
        let strength = serde_json::to_value(report.strength)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        PasswordCheckResponse {
            min_length: report.min_length,
            lowercase: report.lowercase,
            uppercase: report.uppercase,
            digit: report.digit,
            symbol: report.symbol,
            score: report.score,
            strength,
            acceptable: report.is_acceptable(min_score),
            min_score,
            feedback: report.feedback(),
        }
    }
}

/// Validate Document endpoint.
///
/// - **URL:** `/api/validate/document/<value>`
/// - **Method:** `GET`
/// - **Authentication:** none
///
/// The value may carry punctuation, including the `/` of a CNPJ:
/// `/api/validate/document/11.222.333/0001-81`.
#[get("/validate/document/<value..>")]
pub async fn validate_document_endpoint(
    _rate: RateLimited,
    value: PathBuf,
) -> Json<DocumentValidation> {
    let joined = value
        .iter()
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Json(DocumentValidation::check(&joined))
}

/// Password Strength endpoint.
///
/// - **URL:** `/api/validate/password`
/// - **Method:** `POST`
/// - **Authentication:** none
///
/// The body is not logged.
#[post("/validate/password", data = "<request>")]
pub async fn validate_password_endpoint(
    _rate: RateLimited,
    config: &State<AppConfig>,
    request: Json<PasswordCheckRequest>,
) -> Json<PasswordCheckResponse> {
    Json(PasswordCheckResponse::check(
        &request.password,
        config.password_min_score,
    ))
}

pub fn routes() -> Vec<Route> {
    routes![validate_document_endpoint, validate_password_endpoint]
}
