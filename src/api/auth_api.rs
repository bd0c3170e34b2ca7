use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::client::HttpClient;
use crate::errors::AppResult;
use crate::models::auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest, UserInfo,
};
use crate::models::MessageResponse;

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> AppResult<AuthResponse> {
        self.http.post("/auth/login", credentials).await
    }

    pub async fn register(&self, user: &RegisterRequest) -> AppResult<UserInfo> {
        self.http.post("/auth/register", user).await
    }

    pub async fn get_current_user(&self) -> AppResult<UserInfo> {
        self.http.get("/auth/me").await
    }

    pub async fn refresh_token(&self) -> AppResult<AuthResponse> {
        self.http.post_empty("/auth/refresh").await
    }

    pub async fn logout(&self) -> AppResult<MessageResponse> {
        self.http.post_empty("/auth/logout").await
    }
}

/// Operations on the signed-in user's own account.
#[derive(Clone)]
pub struct ProfileApi {
    http: HttpClient,
}

impl ProfileApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn update_profile(&self, profile: &ProfileUpdate) -> AppResult<UserInfo> {
        self.http.put("/auth/me", profile).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> AppResult<MessageResponse> {
        self.http.post("/auth/change-password", request).await
    }

    pub async fn upload_avatar(&self, file_name: &str, content: Vec<u8>) -> AppResult<Value> {
        let form = Form::new().part("avatar", Part::bytes(content).file_name(file_name.to_string()));
        self.http.post_multipart("/auth/upload-avatar", form).await
    }
}
