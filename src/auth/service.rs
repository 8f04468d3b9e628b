use tracing::{info, warn};

use crate::auth::claims::Claims;
use crate::auth::dto::RegisterRequest;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{CreateUserError, UserStore};
use crate::auth::repo_types::{NewUser, User};
use crate::error::ApiError;

/// Register a new user. The lookup here is advisory; the storage unique
/// index is what actually guarantees one non-deleted user per email.
pub async fn register(users: &dyn UserStore, req: RegisterRequest) -> Result<User, ApiError> {
    if users.find_by_email(&req.email, false).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::DuplicateUser);
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            email: req.email,
            firstname: req.firstname,
            lastname: req.lastname,
            password_hash,
            agreed_to_terms: req.agreed_to_terms,
        })
        .await
        .map_err(|e| match e {
            CreateUserError::DuplicateEmail => ApiError::DuplicateUser,
            CreateUserError::Other(e) => ApiError::Internal(e),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Verify credentials and issue an access token. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<String, ApiError> {
    let user = match users.find_by_email(email, false).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(token)
}

/// Validate a bearer token. Token error detail stays inside the auth module.
pub fn validate_token(keys: &JwtKeys, token: &str) -> Result<Claims, ApiError> {
    keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        ApiError::Unauthenticated("Invalid token")
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::repo::MemoryUsers;

    fn make_keys() -> JwtKeys {
        JwtKeys::new(
            "test-secret-at-least-32-bytes-long!!",
            Duration::from_secs(3600),
        )
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "Password123!".into(),
            firstname: "John".into(),
            lastname: "Doe".into(),
            agreed_to_terms: true,
        }
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let users = MemoryUsers::default();
        let keys = make_keys();

        let user = register(&users, register_req("test@example.com"))
            .await
            .expect("register");
        assert_eq!(user.email, "test@example.com");
        assert!(user.agreed_to_terms);
        assert_ne!(user.password_hash, "Password123!");

        let token = login(&users, &keys, "test@example.com", "Password123!")
            .await
            .expect("login");
        let claims = validate_token(&keys, &token).expect("validate");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let users = MemoryUsers::default();
        register(&users, register_req("test@example.com"))
            .await
            .expect("first register");
        let err = register(&users, register_req("test@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateUser));
    }

    #[tokio::test]
    async fn soft_deleted_email_can_register_again() {
        let users = MemoryUsers::default();
        register(&users, register_req("test@example.com"))
            .await
            .expect("first register");
        users.soft_delete("test@example.com");
        register(&users, register_req("test@example.com"))
            .await
            .expect("register after soft delete");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let users = MemoryUsers::default();
        let keys = make_keys();
        register(&users, register_req("test@example.com"))
            .await
            .expect("register");

        let wrong_password = login(&users, &keys, "test@example.com", "wrong-password")
            .await
            .unwrap_err();
        let unknown_email = login(&users, &keys, "missing@example.com", "Password123!")
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.kind(), unknown_email.kind());
    }

    #[tokio::test]
    async fn validate_token_rejects_garbage() {
        let keys = make_keys();
        let err = validate_token(&keys, "garbage").unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated("Invalid token")));
    }
}
