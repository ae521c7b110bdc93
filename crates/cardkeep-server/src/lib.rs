// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use cardkeep_store::Store;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod auth;
mod config;
mod http;
mod mail;

pub use auth::{
    clear_session_cookie, cookie_value, hash_password, random_token, session_cookie, sign_session,
    verify_password, verify_session, AuthClaims, AuthError,
};
pub use config::{validate_startup_config_contract, AppConfig};
pub use mail::{LogMailSender, MailError, MailSender};

pub const CRATE_NAME: &str = "cardkeep-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn MailSender>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<Store>, config: AppConfig) -> Self {
        Self::with_mailer(store, config, Arc::new(LogMailSender))
    }

    #[must_use]
    pub fn with_mailer(store: Arc<Store>, config: AppConfig, mailer: Arc<dyn MailSender>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            mailer,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn next_request_id(&self) -> String {
        format!(
            "req-{:016x}",
            self.request_id_seed.fetch_add(1, Ordering::Relaxed)
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    Router::new()
        .route("/", get(http::pages::landing_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/cards", get(http::pages::catalog_page_handler))
        .route("/decks", get(http::pages::decks_page_handler))
        .route("/decks/{id}", get(http::pages::deck_page_handler))
        .route("/decks/{id}/edit", get(http::pages::deck_editor_page_handler))
        .route("/users/{id}", get(http::pages::user_page_handler))
        .route("/dashboard", get(http::pages::dashboard_page_handler))
        .route("/login", get(http::pages::login_page_handler))
        .route("/register", get(http::pages::register_page_handler))
        .route("/reset", get(http::pages::reset_page_handler))
        .route(
            "/api/cards",
            get(http::handlers::search_cards_handler).post(http::handlers::create_card_handler),
        )
        .route("/api/cards/{id}", get(http::handlers::get_card_handler))
        .route(
            "/api/decks",
            get(http::handlers::list_decks_handler).post(http::handlers::create_deck_handler),
        )
        .route(
            "/api/decks/{id}",
            get(http::handlers::get_deck_handler)
                .put(http::handlers::save_deck_handler)
                .delete(http::handlers::delete_deck_handler),
        )
        .route("/api/users/register", post(http::handlers::register_handler))
        .route("/api/users/login", post(http::handlers::login_handler))
        .route("/api/users/logout", post(http::handlers::logout_handler))
        .route(
            "/api/users/request-reset",
            post(http::handlers::request_reset_handler),
        )
        .route(
            "/api/users/reset-password",
            post(http::handlers::reset_password_handler),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
