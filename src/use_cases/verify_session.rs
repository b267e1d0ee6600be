use crate::domain::entities::Session;
use crate::domain::errors::AuthError;
use crate::domain::ports::{Clock, SessionStore};

// Session verification use case with injected dependencies.
pub struct VerifySessionUseCase<C, S> {
    pub clock: C,
    pub store: S,
}

impl<C, S> VerifySessionUseCase<C, S>
where
    C: Clock,
    S: SessionStore,
{
    pub async fn execute(&self, token: &str) -> Result<Session, AuthError> {
        let session = self
            .store
            .get(token)
            .await
            .map_err(|_| AuthError::StorageFailure)?
            .ok_or(AuthError::InvalidToken)?;

        if session.expires_at <= self.clock.now_epoch_seconds() {
            // Best-effort cleanup of expired session.
            let _ = self.store.remove(token).await;
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }
}
