//! Request and response payloads for the user API.
//!
//! Field names follow the wire contract: `fullname`, `phone_number`,
//! `email`, `password`, `user_type`, `status`.

use crate::error::{ApiError, ApiResult};
use roster_core::{MAX_FULLNAME_LEN, MAX_PHONE_NUMBER_LEN, UserType};
use roster_db::UserRow;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Sign-up request body.
#[derive(Clone, Debug, Deserialize)]
pub struct SignUpRequest {
    pub fullname: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
}

impl SignUpRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.fullname.is_empty() || self.fullname.len() > MAX_FULLNAME_LEN {
            return Err(ApiError::BadRequest(format!(
                "fullname is required and must be at most {MAX_FULLNAME_LEN} characters"
            )));
        }
        if self.phone_number.is_empty() || self.phone_number.len() > MAX_PHONE_NUMBER_LEN {
            return Err(ApiError::BadRequest(format!(
                "phone_number is required and must be at most {MAX_PHONE_NUMBER_LEN} characters"
            )));
        }
        if !self.email.contains('@') {
            return Err(ApiError::BadRequest("email is not valid".to_string()));
        }
        roster_auth::validate_password(&self.password)?;
        Ok(())
    }
}

/// Sign-up response body.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user_id: i64,
}

/// Login request body.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest(
                "email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Expiry, seconds since the Unix epoch.
    pub expired_at: i64,
}

/// User detail response body. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub user_id: i64,
    pub fullname: String,
    pub phone_number: String,
    pub email: String,
    pub user_type: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for UserDetailResponse {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            fullname: row.fullname,
            phone_number: row.phone_number,
            email: row.email,
            user_type: row.user_type,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Partial-update request body. Absent fields leave stored values unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(fullname) = &self.fullname {
            if fullname.is_empty() || fullname.len() > MAX_FULLNAME_LEN {
                return Err(ApiError::BadRequest(format!(
                    "fullname must be at most {MAX_FULLNAME_LEN} characters"
                )));
            }
        }
        if let Some(phone_number) = &self.phone_number {
            if phone_number.is_empty() || phone_number.len() > MAX_PHONE_NUMBER_LEN {
                return Err(ApiError::BadRequest(format!(
                    "phone_number must be at most {MAX_PHONE_NUMBER_LEN} characters"
                )));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ApiError::BadRequest("email is not valid".to_string()));
            }
        }
        if let Some(user_type) = &self.user_type {
            // Rejects anything outside regular_user/premium_user with a 400.
            UserType::parse(user_type)?;
        }
        Ok(())
    }
}

/// Status-transition request body.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New active flag.
    pub status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up() -> SignUpRequest {
        SignUpRequest {
            fullname: "Jane Doe".to_string(),
            phone_number: "0812345678".to_string(),
            email: "jane@example.com".to_string(),
            password: "a-strong-password".to_string(),
        }
    }

    #[test]
    fn sign_up_accepts_valid_request() {
        assert!(sign_up().validate().is_ok());
    }

    #[test]
    fn sign_up_rejects_long_fullname() {
        let req = SignUpRequest {
            fullname: "x".repeat(MAX_FULLNAME_LEN + 1),
            ..sign_up()
        };
        assert!(matches!(req.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn sign_up_rejects_bad_email() {
        let req = SignUpRequest {
            email: "not-an-email".to_string(),
            ..sign_up()
        };
        assert!(matches!(req.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn sign_up_rejects_short_password() {
        let req = SignUpRequest {
            password: "short".to_string(),
            ..sign_up()
        };
        assert!(matches!(req.validate(), Err(ApiError::Auth(_))));
    }

    #[test]
    fn update_rejects_unknown_user_type() {
        let req = UpdateUserRequest {
            user_type: Some("admin_user".to_string()),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(ApiError::Core(_))));
    }

    #[test]
    fn update_accepts_sparse_request() {
        let req = UpdateUserRequest {
            fullname: Some("New Name".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn detail_response_drops_password() {
        let row = UserRow {
            user_id: 7,
            email: "a@b.c".to_string(),
            password: "$2b$04$secret".to_string(),
            fullname: "A".to_string(),
            phone_number: "08123".to_string(),
            user_type: "regular_user".to_string(),
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            created_by: "a@b.c".to_string(),
            updated_at: OffsetDateTime::UNIX_EPOCH,
            updated_by: "a@b.c".to_string(),
        };
        let json = serde_json::to_value(UserDetailResponse::from(row)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["user_id"], 7);
    }
}
