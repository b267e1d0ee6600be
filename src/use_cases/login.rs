use uuid::Uuid;

use crate::domain::entities::{Session, User};
use crate::domain::errors::AuthError;
use crate::domain::ports::{Clock, Directory, SessionStore};

// Response returned by the login use case.
pub struct LoginResponse {
    pub token: String,
    pub expires_at: u64,
    pub user: User,
}

// Login use case with injected dependencies.
pub struct LoginUseCase<C, S, D> {
    pub clock: C,
    pub store: S,
    pub directory: D,
    pub ttl_seconds: u64,
}

impl<C, S, D> LoginUseCase<C, S, D>
where
    C: Clock,
    S: SessionStore,
    D: Directory,
{
    pub async fn execute(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthError> {
        if username.is_empty() {
            return Err(AuthError::LoginFailed);
        }

        let user = self
            .directory
            .authenticate(username, password)
            .await
            .map_err(|_| AuthError::StorageFailure)?
            .ok_or(AuthError::LoginFailed)?;

        let now = self.clock.now_epoch_seconds();
        let pruned = self
            .store
            .remove_expired(now)
            .await
            .map_err(|_| AuthError::StorageFailure)?;
        if pruned > 0 {
            tracing::debug!(pruned, "expired sessions removed");
        }

        let token = Uuid::new_v4().to_string();
        let expires_at = now.saturating_add(self.ttl_seconds);

        let session = Session {
            username: user.username.clone(),
            expires_at,
        };

        self.store
            .insert(token.clone(), session)
            .await
            .map_err(|_| AuthError::StorageFailure)?;

        Ok(LoginResponse {
            token,
            expires_at,
            user,
        })
    }
}
