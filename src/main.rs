use anyhow::Context;
use tracing::{info, warn};

use llm_chat_client::navigation::{Navigation, Route, RouteGuard};
use llm_chat_client::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let default_filter = if config.is_development() {
        "llm_chat_client=debug"
    } else {
        "llm_chat_client=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    info!(base_url = %config.api_base_url, storage = %config.storage_path.display(), "Starting client");

    let state = AppState::open(config).context("Failed to open local storage")?;
    let _session_watcher = state.watch_session_events();

    // ── Local state ───────────────────────────────────────────────────────────
    state.settings.load_settings().await;
    state.chat.restore_from_storage().await;

    // ── Entry route ───────────────────────────────────────────────────────────
    let requested = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    let route = Route::from_path(&requested).unwrap_or(Route::Chat);
    let route = match RouteGuard::resolve(&state.auth, route).await {
        Navigation::Allow => route,
        Navigation::Redirect(target) => {
            info!("Redirecting from {} to {}", route.path(), target.path());
            target
        }
    };

    if route == Route::Login {
        info!("No valid session; sign in to continue");
        return Ok(());
    }

    // ── Initial data ──────────────────────────────────────────────────────────
    let (conversations, models, prompts, knowledge_bases) = tokio::join!(
        state.chat.load_conversations(),
        state.models.load_models(),
        state.prompts.load_prompts(),
        state.knowledge.load_knowledge_bases(),
    );
    for (what, failed) in [
        ("conversations", conversations.is_err()),
        ("models", models.is_err()),
        ("prompt templates", prompts.is_err()),
        ("knowledge bases", knowledge_bases.is_err()),
    ] {
        if failed {
            warn!("Showing cached {what}, if any");
        }
    }
    if let Err(e) = state.models.load_default_model().await {
        warn!("Default model unavailable: {e}");
    }

    let user = state.auth.user().await.map(|u| u.username).unwrap_or_default();
    info!(
        user = %user,
        route = route.title(),
        conversations = state.chat.conversations().await.len(),
        models = state.models.models().await.len(),
        prompts = state.prompts.prompts().await.len(),
        knowledge_bases = state.knowledge.knowledge_bases().await.len(),
        "Session ready"
    );

    state.chat.save_to_storage().await;
    Ok(())
}
