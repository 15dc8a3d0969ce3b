//! Error bodies shared by every endpoint.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Body of every failed API response.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = status::Custom<Json<ErrorResponse>>;
pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    status::Custom(
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(Status::BadRequest, message)
}

/// 404 for `what`, also used for rows of orgs the caller cannot see.
pub fn not_found(what: &str) -> ApiError {
    api_error(Status::NotFound, format!("{} not found", what))
}

pub fn forbidden(message: impl Into<String>) -> ApiError {
    api_error(Status::Forbidden, message)
}

pub fn conflict(message: impl Into<String>) -> ApiError {
    api_error(Status::Conflict, message)
}

/// Maps a storage error to a response. Constraint failures are the
/// client's fault; anything else is logged and reported as 500.
pub fn storage_error(context: &str, e: DieselError) -> ApiError {
    match e {
        DieselError::NotFound => api_error(Status::NotFound, format!("{}: not found", context)),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            warn!("{}: unique violation: {}", context, info.message());
            conflict(format!("{}: a record with the same unique values already exists", context))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            warn!("{}: foreign key violation: {}", context, info.message());
            bad_request(format!("{}: referenced record does not exist", context))
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info)
        | DieselError::DatabaseError(DatabaseErrorKind::NotNullViolation, info) => {
            warn!("{}: constraint violation: {}", context, info.message());
            bad_request(format!("{}: value out of range", context))
        }
        other => {
            error!("{}: {:?}", context, other);
            api_error(
                Status::InternalServerError,
                format!("Internal server error while {}", context.to_lowercase()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = storage_error("Loading obra", DieselError::NotFound);
        assert_eq!(err.0, Status::NotFound);
    }

    #[test]
    fn test_unexpected_errors_map_to_500() {
        let err = storage_error("Creating obra", DieselError::RollbackTransaction);
        assert_eq!(err.0, Status::InternalServerError);
        assert_eq!(err.1.error, "Internal server error while creating obra");
    }

    #[test]
    fn test_unique_violation_is_a_conflict() {
        let mut conn = crate::orm::testing::setup_test_db();
        crate::orm::org::insert_org(&mut conn, "Construtora Alfa".to_string(), None, None).unwrap();
        let dup = crate::orm::org::insert_org(&mut conn, "Construtora Alfa".to_string(), None, None)
            .unwrap_err();
        assert_eq!(storage_error("Creating org", dup).0, Status::Conflict);
    }
}
