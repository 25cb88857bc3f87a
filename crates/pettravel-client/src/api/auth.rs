use super::{PetTravelClient, decode, json_body};
use crate::ApiResult;
use crate::endpoints::Endpoint;
use crate::error::ApiError;
use crate::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, PasswordResetConfirmRequest,
    PasswordResetRequest, RegisterRequest, UpdateProfileRequest, User, VerifyEmailRequest,
};

impl PetTravelClient {
    /// Signs in and stores the session.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        let body = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.authenticate(Endpoint::Login, json_body(&body)?).await
    }

    /// Creates an account and signs in with it.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        self.authenticate(Endpoint::Register, json_body(request)?).await
    }

    async fn authenticate(
        &self,
        endpoint: Endpoint,
        body: crate::executor::RequestBody,
    ) -> ApiResult<User> {
        let value = self.send(&endpoint, Some(body)).await?;
        let response: AuthResponse = decode(value)?;

        let same_user = self
            .inner
            .store
            .user()
            .is_some_and(|previous| previous.id == response.user.id);
        self.inner
            .store
            .set_session(response.user.clone(), response.tokens)?;
        self.inner.interceptor.reset();
        if same_user {
            self.inner.cache.invalidate(&endpoint.invalidates());
        } else {
            // Reads cached for another account must never be served.
            self.inner.cache.clear();
        }
        Ok(response.user)
    }

    /// Drops the session and every cached read. Never fails.
    pub fn logout(&self) {
        self.inner.store.clear_session();
        self.inner.cache.invalidate(&Endpoint::Logout.invalidates());
        self.inner.cache.clear();
        self.inner.interceptor.reset();
    }

    /// Current profile; also refreshes the stored user.
    pub async fn profile(&self) -> ApiResult<User> {
        let user: User = self.query(Endpoint::GetProfile).await?;
        if self.is_authenticated() {
            self.inner.store.set_user(user.clone())?;
        }
        Ok(user)
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResult<User> {
        let user: User = self.mutate_json(Endpoint::UpdateProfile, request).await?;
        if self.is_authenticated() {
            self.inner.store.set_user(user.clone())?;
        }
        Ok(user)
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> ApiResult<MessageResponse> {
        self.mutate_json(Endpoint::ChangePassword, request).await
    }

    pub async fn request_password_reset(&self, email: &str) -> ApiResult<MessageResponse> {
        let body = PasswordResetRequest {
            email: email.trim().to_string(),
        };
        self.mutate_json(Endpoint::RequestPasswordReset, &body).await
    }

    pub async fn confirm_password_reset(
        &self,
        request: &PasswordResetConfirmRequest,
    ) -> ApiResult<MessageResponse> {
        self.mutate_json(Endpoint::ConfirmPasswordReset, request)
            .await
    }

    pub async fn verify_email(&self, token: &str) -> ApiResult<MessageResponse> {
        let body = VerifyEmailRequest {
            token: token.trim().to_string(),
        };
        self.mutate_json(Endpoint::VerifyEmail, &body).await
    }

    /// Asks the backend whether the held access token is still valid.
    /// Returns `false` when no session is held.
    pub async fn verify_token(&self) -> ApiResult<bool> {
        let Some(token) = self.inner.store.access_token() else {
            return Ok(false);
        };
        let body = serde_json::json!({ "token": token });
        match self.send(&Endpoint::VerifyToken, Some(json_body(&body)?)).await {
            Ok(_) => Ok(true),
            Err(ApiError::Auth { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
