/*
 * Responsibility
 * - Config読み込み → 依存生成 → security chain 組み立て → Router 組み立て
 * - axum::serve() で起動
 * - chain の組み立て失敗は起動失敗 (listener を bind する前に落とす)
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, ConfigError};
use crate::middleware;
use crate::security::{JsonAccessDeniedHandler, JsonAuthenticationEntryPoint, SecurityChain};
use crate::services::auth::{TokenVerifier, build_token_verifier};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,bearer_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost"
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let verifier = build_token_verifier(&config.auth).context("failed to build token verifier")?;
    let app = build_app(&config, verifier).context("failed to assemble security chain")?;

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Composition root: build the chain once and wrap the API routes in it.
pub fn build_chain(
    config: &Config,
    verifier: Arc<dyn TokenVerifier>,
) -> Result<SecurityChain, ConfigError> {
    SecurityChain::builder(
        verifier,
        Arc::new(JsonAuthenticationEntryPoint),
        Arc::new(JsonAccessDeniedHandler),
    )
    .cors(config.cors.clone())
    .public_paths(config.public_paths.clone())
    .authority_rules(config.authority_rules.clone())
    .build()
}

pub fn build_app(config: &Config, verifier: Arc<dyn TokenVerifier>) -> Result<Router, ConfigError> {
    let chain = build_chain(config, verifier)?;
    let router = chain.apply(api::routes());

    Ok(middleware::http::apply(router, &config.http))
}
