//! Application routes and the authentication guard in front of them.

use crate::store::AuthStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Chat,
    Models,
    Prompts,
    Knowledge,
    Settings,
    Profile,
    Todos,
    ImageGeneration,
    Mcp,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Login,
        Route::Chat,
        Route::Models,
        Route::Prompts,
        Route::Knowledge,
        Route::Settings,
        Route::Profile,
        Route::Todos,
        Route::ImageGeneration,
        Route::Mcp,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Chat => "/",
            Route::Models => "/models",
            Route::Prompts => "/prompts",
            Route::Knowledge => "/knowledge",
            Route::Settings => "/settings",
            Route::Profile => "/profile",
            Route::Todos => "/todos",
            Route::ImageGeneration => "/image-generation",
            Route::Mcp => "/mcp",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Chat => "Chat",
            Route::Models => "Model management",
            Route::Prompts => "Prompt templates",
            Route::Knowledge => "Knowledge bases",
            Route::Settings => "Settings",
            Route::Profile => "Profile",
            Route::Todos => "Todos",
            Route::ImageGeneration => "Image generation",
            Route::Mcp => "MCP sessions",
        }
    }

    /// Everything except the login screen.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Exact match on the path; a trailing slash is ignored.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(Route),
}

pub struct RouteGuard;

impl RouteGuard {
    /// Decides whether navigating to `to` may proceed.
    ///
    /// An unauthenticated session first gets a chance to restore itself from
    /// storage. An authenticated one is trusted as is, even while its
    /// background validation is still pending.
    pub async fn resolve(auth: &AuthStore, to: Route) -> Navigation {
        if !auth.is_authenticated().await {
            auth.init_auth().await;
        }
        let authenticated = auth.is_authenticated().await;

        match (to.requires_auth(), authenticated) {
            (true, false) => Navigation::Redirect(Route::Login),
            (false, true) if to == Route::Login => Navigation::Redirect(Route::Chat),
            _ => Navigation::Allow,
        }
    }
}
