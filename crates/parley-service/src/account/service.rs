//! Account service: registration, credential checks, and profile updates.

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use parley_auth::jwt::encoder::IssuedToken;
use parley_auth::{JwtEncoder, PasswordHasher, PasswordValidator};
use parley_core::config::AuthConfig;
use parley_core::error::{AppError, ErrorKind};
use parley_core::result::AppResult;
use parley_entity::user::{CreateUser, User};
use parley_storage::{ImageUpload, StorageManager};

use super::normalize::{default_avatar_url, normalize_email, title_case};
use super::request::{SignInRequest, SignUpRequest, first_message};
use crate::context::RequestContext;
use crate::store::UserStore;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A signed-in user together with the session token to hand back.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The account, without its password hash when serialized.
    pub user: User,
    /// Freshly issued session token.
    pub token: IssuedToken,
}

/// Handles account use cases.
#[derive(Debug, Clone)]
pub struct AccountService {
    /// User directory.
    users: Arc<dyn UserStore>,
    /// Password hasher.
    hasher: PasswordHasher,
    /// Sign-up password policy.
    policy: PasswordValidator,
    /// Session token issuer.
    encoder: Arc<JwtEncoder>,
    /// Image storage for profile pictures.
    storage: Arc<StorageManager>,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        users: Arc<dyn UserStore>,
        encoder: Arc<JwtEncoder>,
        storage: Arc<StorageManager>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            policy: PasswordValidator::new(auth),
            encoder,
            storage,
        }
    }

    /// Register a new account and start a session for it.
    pub async fn sign_up(&self, req: SignUpRequest) -> AppResult<AuthSession> {
        let req = req.trimmed();
        let errors = req.validate().err();

        if let Some(message) = errors
            .as_ref()
            .and_then(|e| first_message(e, &["full_name", "email"]))
        {
            return Err(AppError::validation(message));
        }
        self.policy.validate(&req.password)?;
        if let Some(message) = errors
            .as_ref()
            .and_then(|e| first_message(e, &["confirm_password"]))
        {
            return Err(AppError::validation(message));
        }

        let full_name = title_case(&req.full_name);
        let email = normalize_email(&req.email);

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::validation("Email is already taken"));
        }

        let profile_picture = req
            .profile_picture
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_avatar_url(&full_name));

        let password_hash = self.hasher.hash_password(&req.password)?;

        let user = self
            .users
            .create_user(CreateUser {
                full_name,
                email,
                password_hash,
                profile_picture,
            })
            .await
            .map_err(|e| match e.kind {
                // Lost a race with a concurrent sign-up for the same address.
                ErrorKind::Conflict => AppError::validation("Email is already taken"),
                _ => e,
            })?;

        let token = self.encoder.generate_token(user.id)?;
        info!(user_id = %user.id, "User signed up");

        Ok(AuthSession { user, token })
    }

    /// Check credentials and start a session.
    ///
    /// Every failure reports the same message so callers cannot probe for
    /// registered addresses.
    pub async fn sign_in(&self, req: SignInRequest) -> AppResult<AuthSession> {
        let req = SignInRequest {
            email: normalize_email(&req.email),
            password: req.password,
        };
        if req.validate().is_err() {
            return Err(AppError::validation(INVALID_CREDENTIALS));
        }

        let user = self
            .users
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::validation(INVALID_CREDENTIALS))?;

        let matches = self
            .hasher
            .verify_password(&req.password, &user.password_hash)
            .unwrap_or_else(|e| {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                false
            });
        if !matches {
            return Err(AppError::validation(INVALID_CREDENTIALS));
        }

        let token = self.encoder.generate_token(user.id)?;
        info!(user_id = %user.id, "User signed in");

        Ok(AuthSession { user, token })
    }

    /// The caller's own profile.
    pub async fn profile(&self, ctx: &RequestContext) -> AppResult<User> {
        self.users
            .find_user(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Upload a new profile picture and point the account at it.
    pub async fn update_profile_picture(
        &self,
        ctx: &RequestContext,
        upload: Option<ImageUpload>,
    ) -> AppResult<User> {
        let user = self.profile(ctx).await?;

        let upload = upload
            .filter(|u| !u.data.is_empty() && !u.file_name.is_empty())
            .ok_or_else(|| AppError::validation("Profile picture is required"))?;

        let max = self.storage.max_image_size_bytes();
        if upload.size() > max {
            return Err(AppError::validation(format!(
                "Profile picture must be less than {}MB",
                max / (1024 * 1024)
            )));
        }
        if !is_image(&upload.content_type) {
            return Err(AppError::validation("Profile picture must be an image"));
        }

        let url = self.storage.store_image(user.id, upload).await?;
        let updated = self.users.set_profile_picture(user.id, &url).await?;

        info!(user_id = %user.id, url = %url, "Profile picture updated");
        Ok(updated)
    }
}

/// Whether a declared content type is acceptable for an image upload.
///
/// An empty type is accepted; the client did not declare one.
pub(crate) fn is_image(content_type: &str) -> bool {
    content_type.is_empty() || content_type.to_ascii_lowercase().starts_with("image/")
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use parley_auth::JwtDecoder;
    use parley_storage::providers::LocalObjectStore;

    use super::*;
    use crate::store::MemoryStore;

    struct Fixture {
        service: AccountService,
        decoder: JwtDecoder,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let auth = AuthConfig {
            jwt_secret: "test-secret-with-enough-length".into(),
            ..AuthConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let local = LocalObjectStore::new(dir.path().to_str().unwrap(), "/uploads")
            .await
            .unwrap();
        let storage = Arc::new(StorageManager::new(Arc::new(local), 5 * 1024 * 1024));
        let service = AccountService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(JwtEncoder::new(&auth)),
            storage,
            &auth,
        );
        Fixture {
            service,
            decoder: JwtDecoder::new(&auth),
            _dir: dir,
        }
    }

    fn sign_up_request() -> SignUpRequest {
        SignUpRequest {
            full_name: "  ada   LOVELACE ".into(),
            email: " Ada@Example.com ".into(),
            password: "Str0ng!Pass".into(),
            confirm_password: "Str0ng!Pass".into(),
            profile_picture: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_normalizes_and_issues_token() {
        let f = fixture().await;
        let session = f.service.sign_up(sign_up_request()).await.unwrap();

        assert_eq!(session.user.full_name, "Ada Lovelace");
        assert_eq!(session.user.email, "ada@example.com");
        assert_eq!(
            session.user.profile_picture,
            "https://api.dicebear.com/8.x/initials/svg?seed=Ada%20Lovelace"
        );
        assert_ne!(session.user.password_hash, "Str0ng!Pass");
        assert_eq!(f.decoder.verify(&session.token.token).unwrap(), session.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let f = fixture().await;
        f.service.sign_up(sign_up_request()).await.unwrap();

        let err = f.service.sign_up(sign_up_request()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Email is already taken");
    }

    #[tokio::test]
    async fn test_sign_up_rule_order() {
        let f = fixture().await;

        let err = f
            .service
            .sign_up(SignUpRequest {
                password: "weak".into(),
                confirm_password: "different".into(),
                ..sign_up_request()
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "Password must be at least 8 characters long");

        let err = f
            .service
            .sign_up(SignUpRequest {
                confirm_password: "Str0ng!Pasz".into(),
                ..sign_up_request()
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "Passwords don't match");
    }

    #[tokio::test]
    async fn test_sign_in_uniform_failure() {
        let f = fixture().await;
        f.service.sign_up(sign_up_request()).await.unwrap();

        for (email, password) in [
            ("ada@example.com", "Wr0ng!Pass"),
            ("nobody@example.com", "Str0ng!Pass"),
            ("not-an-email", "Str0ng!Pass"),
            ("ada@example.com", ""),
        ] {
            let err = f
                .service
                .sign_in(SignInRequest {
                    email: email.into(),
                    password: password.into(),
                })
                .await
                .unwrap_err();
            assert_eq!(err.message, INVALID_CREDENTIALS);
        }

        let session = f
            .service
            .sign_in(SignInRequest {
                email: "ADA@example.com ".into(),
                password: "Str0ng!Pass".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_update_profile_picture() {
        let f = fixture().await;
        let session = f.service.sign_up(sign_up_request()).await.unwrap();
        let ctx = RequestContext::new(session.user.id);

        let err = f
            .service
            .update_profile_picture(&ctx, None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Profile picture is required");

        let updated = f
            .service
            .update_profile_picture(
                &ctx,
                Some(ImageUpload {
                    file_name: "me.PNG".into(),
                    content_type: "image/png".into(),
                    data: Bytes::from_static(b"\x89PNG"),
                }),
            )
            .await
            .unwrap();
        let prefix = format!("/uploads/{}-", session.user.id);
        assert!(updated.profile_picture.starts_with(&prefix));
        assert!(updated.profile_picture.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_profile_picture_limits() {
        let f = fixture().await;
        let session = f.service.sign_up(sign_up_request()).await.unwrap();
        let ctx = RequestContext::new(session.user.id);

        let err = f
            .service
            .update_profile_picture(
                &ctx,
                Some(ImageUpload {
                    file_name: "big.jpg".into(),
                    content_type: "image/jpeg".into(),
                    data: Bytes::from(vec![0u8; 5 * 1024 * 1024 + 1]),
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Profile picture must be less than 5MB");

        let err = f
            .service
            .update_profile_picture(
                &ctx,
                Some(ImageUpload {
                    file_name: "notes.txt".into(),
                    content_type: "text/plain".into(),
                    data: Bytes::from_static(b"hello"),
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_profile_of_missing_user() {
        let f = fixture().await;
        let ctx = RequestContext::new(parley_core::types::id::UserId::new());
        let err = f.service.profile(&ctx).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
