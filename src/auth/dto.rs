use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub agreed_to_terms: bool,
}

impl RegisterRequest {
    /// Normalize and validate before the service is reached.
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.email = self.email.trim().to_lowercase();
        if !is_valid_email(&self.email) {
            return Err(ApiError::MalformedInput("Invalid email".into()));
        }
        if self.password.len() < 8 {
            return Err(ApiError::MalformedInput("Password too short".into()));
        }
        Ok(())
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            firstname: u.firstname,
            lastname: u.lastname,
        }
    }
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn register_request_uses_camel_case_on_the_wire() {
        let body = r#"{
            "email": "A@B.com ",
            "password": "Password123!",
            "firstname": "A",
            "lastname": "B",
            "agreedToTerms": true
        }"#;
        let mut req: RegisterRequest = serde_json::from_str(body).expect("deserialize");
        assert!(req.agreed_to_terms);
        req.validate().expect("valid request");
        assert_eq!(req.email, "a@b.com");
    }

    #[test]
    fn validate_rejects_bad_email_and_short_password() {
        let mut bad_email = RegisterRequest {
            email: "nope".into(),
            password: "Password123!".into(),
            firstname: "A".into(),
            lastname: "B".into(),
            agreed_to_terms: false,
        };
        let err = bad_email.validate().unwrap_err();
        assert!(matches!(err, ApiError::MalformedInput(_)));

        let mut short_password = RegisterRequest {
            email: "a@b.com".into(),
            password: "short".into(),
            firstname: "A".into(),
            lastname: "B".into(),
            agreed_to_terms: false,
        };
        let err = short_password.validate().unwrap_err();
        assert!(matches!(err, ApiError::MalformedInput(_)));
    }
}
