use crate::domain::errors::AuthError;
use crate::domain::ports::SessionStore;

// Response returned by the logout use case.
pub struct LogoutResponse {
    pub revoked: bool,
}

// Logout use case with injected dependencies.
pub struct LogoutUseCase<S> {
    pub store: S,
}

impl<S> LogoutUseCase<S>
where
    S: SessionStore,
{
    // A missing token is not an error; there is simply nothing to revoke.
    pub async fn execute(&self, token: Option<&str>) -> Result<LogoutResponse, AuthError> {
        let Some(token) = token else {
            return Ok(LogoutResponse { revoked: false });
        };

        let revoked = self
            .store
            .remove(token)
            .await
            .map_err(|_| AuthError::StorageFailure)?;

        Ok(LogoutResponse { revoked })
    }
}
