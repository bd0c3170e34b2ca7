use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{AuthApi, ProfileApi, SessionEvent};
use crate::errors::AppResult;
use crate::models::auth::{LoginRequest, ProfileUpdate, RegisterRequest, UserInfo};
use crate::storage::{keys, Mirror};

#[derive(Debug, Default)]
struct AuthState {
    user: Option<UserInfo>,
    token: Option<String>,
    is_authenticated: bool,
    is_loading: bool,
}

/// Session identity: the bearer credential and the signed-in profile.
///
/// The credential is never validated ahead of time. It is trusted until the
/// backend rejects it, at which point the HTTP layer clears it and
/// [`AuthStore::handle_session_event`] resets this store.
pub struct AuthStore {
    api: AuthApi,
    profile_api: ProfileApi,
    mirror: Mirror,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(api: AuthApi, profile_api: ProfileApi, mirror: Mirror) -> Self {
        Self { api, profile_api, mirror, state: RwLock::new(AuthState::default()) }
    }

    pub async fn user(&self) -> Option<UserInfo> {
        self.state.read().await.user.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn check_auth(&self) -> bool {
        let state = self.state.read().await;
        state.is_authenticated && state.token.is_some()
    }

    /// Restores a persisted session and re-validates it against the backend.
    /// A failed validation logs out completely. Safe to call repeatedly.
    pub async fn init_auth(&self) {
        if self.restore_session().await {
            self.validate_session().await;
        }
    }

    /// Like [`init_auth`](Self::init_auth), but the validation runs in the
    /// background. The session reads as authenticated as soon as this
    /// returns, possibly before the backend has confirmed the credential.
    pub async fn spawn_init_auth(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.restore_session().await {
            return None;
        }
        Some(tokio::spawn(async move { self.validate_session().await }))
    }

    /// Optimistically marks the session authenticated when both the
    /// credential and the profile are persisted.
    async fn restore_session(&self) -> bool {
        let token = self.mirror.load_raw(keys::ACCESS_TOKEN).filter(|t| !t.is_empty());
        let user = self.mirror.load::<UserInfo>(keys::USER_INFO);
        let (Some(token), Some(user)) = (token, user) else {
            return false;
        };

        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = Some(user);
        state.is_authenticated = true;
        true
    }

    async fn validate_session(&self) {
        match self.api.get_current_user().await {
            Ok(user) => {
                self.mirror.save(keys::USER_INFO, &user);
                self.state.write().await.user = Some(user);
            }
            Err(e) => {
                warn!("Stored session is no longer valid: {e}");
                self.logout().await;
            }
        }
    }

    /// Exchanges credentials for a token, fetches the profile and drops any
    /// conversation data cached by a previous user before reporting the
    /// session as authenticated.
    pub async fn login(&self, credentials: &LoginRequest) -> AppResult<UserInfo> {
        self.state.write().await.is_loading = true;
        let result = self.sign_in(credentials).await;
        self.state.write().await.is_loading = false;
        result
    }

    async fn sign_in(&self, credentials: &LoginRequest) -> AppResult<UserInfo> {
        let auth = self.api.login(credentials).await.map_err(|e| {
            error!("Login failed: {}", e.detail());
            e
        })?;
        self.mirror.save_raw(keys::ACCESS_TOKEN, &auth.access_token);

        let user = match self.api.get_current_user().await {
            Ok(user) => user,
            Err(e) => {
                error!("Login succeeded but the profile could not be fetched: {e}");
                self.mirror.remove(keys::ACCESS_TOKEN);
                return Err(e);
            }
        };
        self.mirror.save(keys::USER_INFO, &user);
        self.clear_conversation_cache();

        let mut state = self.state.write().await;
        state.token = Some(auth.access_token);
        state.user = Some(user.clone());
        state.is_authenticated = true;
        info!("Signed in as {}", user.username);
        Ok(user)
    }

    /// Registers the account, then signs in with the same credentials.
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<UserInfo> {
        self.state.write().await.is_loading = true;
        let registered = self.api.register(request).await;
        self.state.write().await.is_loading = false;

        registered.map_err(|e| {
            error!("Registration failed: {}", e.detail());
            e
        })?;
        self.login(&LoginRequest {
            username: request.username.clone(),
            password: request.password.clone(),
        })
        .await
    }

    /// Notifies the backend when a credential is held, then clears the local
    /// session regardless of the outcome.
    pub async fn logout(&self) {
        if self.state.read().await.token.is_some() {
            if let Err(e) = self.api.logout().await {
                error!("Logout request failed: {e}");
            }
        }
        self.force_logout().await;
    }

    /// Clears the session locally without contacting the backend.
    pub async fn force_logout(&self) {
        *self.state.write().await = AuthState::default();
        self.mirror.remove(keys::ACCESS_TOKEN);
        self.mirror.remove(keys::USER_INFO);
    }

    pub async fn refresh_user_info(&self) -> AppResult<()> {
        if self.state.read().await.token.is_none() {
            return Ok(());
        }
        match self.api.get_current_user().await {
            Ok(user) => {
                self.mirror.save(keys::USER_INFO, &user);
                self.state.write().await.user = Some(user);
                Ok(())
            }
            Err(e) => {
                error!("Failed to refresh user info: {e}");
                self.logout().await;
                Err(e)
            }
        }
    }

    pub async fn refresh_token(&self) -> AppResult<()> {
        let auth = self.api.refresh_token().await.map_err(|e| {
            error!("Failed to refresh token: {e}");
            e
        })?;
        self.mirror.save_raw(keys::ACCESS_TOKEN, &auth.access_token);
        self.state.write().await.token = Some(auth.access_token);
        Ok(())
    }

    pub async fn update_profile(&self, profile: &ProfileUpdate) -> AppResult<UserInfo> {
        let user = self.profile_api.update_profile(profile).await.map_err(|e| {
            error!("Failed to update profile: {}", e.detail());
            e
        })?;
        self.mirror.save(keys::USER_INFO, &user);
        self.state.write().await.user = Some(user.clone());
        Ok(user)
    }

    /// Removes the caches owned by the previous account: conversations with
    /// their selection and messages, todos, knowledge bases and their
    /// documents. Keys are not scoped per user, so these would otherwise leak
    /// into the next session. Models, prompts and settings are kept.
    pub fn clear_conversation_cache(&self) {
        self.mirror.remove(keys::CONVERSATIONS);
        self.mirror.remove(keys::CURRENT_CONVERSATION_ID);
        self.mirror.remove_prefix(keys::MESSAGES_PREFIX);
        self.mirror.remove(keys::TODOS);
        self.mirror.remove(keys::KNOWLEDGE_BASES);
        self.mirror.remove_prefix(keys::DOCUMENTS_PREFIX);
    }

    pub async fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Unauthorized => {
                warn!("Session rejected by the backend, signing out");
                self.force_logout().await;
            }
        }
    }

    /// Applies session events until the sender side is dropped.
    pub fn watch_session_events(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.handle_session_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {skipped} session events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
