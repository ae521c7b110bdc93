// SPDX-License-Identifier: Apache-2.0

use crate::auth::{
    clear_session_cookie, cookie_value, hash_password, random_token, session_cookie, sign_session,
    verify_password, verify_session, AuthClaims,
};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cardkeep_api::{
    parse_card_search_params, ApiError, CreateDeckBody, LoginBody, RegisterBody, RequestResetBody,
    ResetPasswordBody, SaveResponse,
};
use cardkeep_model::{CardId, CardRecord, DeckId, DeckSnapshot};
use cardkeep_store::{hash_reset_token, unix_seconds, StoreError};
use serde_json::json;
use std::collections::BTreeMap;

pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({"error": err}))).into_response()
}

/// Maps store failures onto the API error envelope. Unexpected failures
/// get a request id in the log and an opaque 500.
pub(crate) fn store_error_response(state: &AppState, err: &StoreError) -> Response {
    match err {
        StoreError::NotFound(what) => {
            api_error_response(StatusCode::NOT_FOUND, ApiError::not_found(what))
        }
        StoreError::Duplicate(what) => {
            api_error_response(StatusCode::CONFLICT, ApiError::conflict(what))
        }
        StoreError::Invalid(msg) => api_error_response(
            StatusCode::BAD_REQUEST,
            ApiError::validation_failed(json!([{"reason": msg}])),
        ),
        _ => {
            let request_id = state.next_request_id();
            tracing::error!(request_id, error = %err, "store operation failed");
            api_error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal())
        }
    }
}

/// Session check for API handlers. A missing, expired, or forged token is
/// a single 401; the response never says which.
pub(crate) fn require_session(state: &AppState, headers: &HeaderMap) -> Result<AuthClaims, Response> {
    let token = cookie_value(headers, &state.config.cookie_name).ok_or_else(|| {
        api_error_response(StatusCode::UNAUTHORIZED, ApiError::unauthorized())
    })?;
    verify_session(&token, state.config.auth_secret.as_bytes(), unix_seconds())
        .map_err(|_| api_error_response(StatusCode::UNAUTHORIZED, ApiError::unauthorized()))
}

pub(crate) fn optional_session(state: &AppState, headers: &HeaderMap) -> Option<AuthClaims> {
    let token = cookie_value(headers, &state.config.cookie_name)?;
    verify_session(&token, state.config.auth_secret.as_bytes(), unix_seconds()).ok()
}

pub(crate) async fn healthz_handler() -> &'static str {
    "ok"
}

pub(crate) async fn search_cards_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let params = match parse_card_search_params(&query) {
        Ok(params) => params,
        Err(err) => return api_error_response(StatusCode::BAD_REQUEST, err),
    };
    if params.empty_query {
        return Json(json!({"cards": []})).into_response();
    }
    match state.store.search_cards(&params.filter) {
        Ok(cards) => Json(json!({"cards": cards})).into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn create_card_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(card): Json<CardRecord>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    if let Err(err) = card.validate() {
        return api_error_response(
            StatusCode::BAD_REQUEST,
            ApiError::validation_failed(json!([{"reason": err.to_string()}])),
        );
    }
    match state.store.insert_card(&card) {
        Ok(()) => (StatusCode::CREATED, Json(card)).into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn get_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Ok(card_id) = CardId::parse(&id) else {
        return api_error_response(StatusCode::BAD_REQUEST, ApiError::invalid_param("id", &id));
    };
    match state.store.get_card(&card_id) {
        Ok(Some(card)) => Json(card).into_response(),
        Ok(None) => api_error_response(StatusCode::NOT_FOUND, ApiError::not_found("card")),
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn list_decks_handler(State(state): State<AppState>) -> Response {
    match state.store.list_decks() {
        Ok(decks) => Json(json!({"decks": decks})).into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn create_deck_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateDeckBody>,
) -> Response {
    let claims = match require_session(&state, &headers) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    match state.store.create_deck(
        &claims.user_id,
        &body.name,
        body.description.as_deref(),
        unix_seconds(),
    ) {
        Ok(deck) => (StatusCode::CREATED, Json(deck)).into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn get_deck_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let Ok(deck_id) = DeckId::parse(&id) else {
        return api_error_response(StatusCode::BAD_REQUEST, ApiError::invalid_param("id", &id));
    };
    match state.store.deck_view(&deck_id) {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => api_error_response(StatusCode::NOT_FOUND, ApiError::not_found("deck")),
        Err(err) => store_error_response(&state, &err),
    }
}

/// Full-replacement save. The body is the editor's complete snapshot, so
/// concurrent saves resolve to whichever request lands last.
pub(crate) async fn save_deck_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(snapshot): Json<DeckSnapshot>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let Ok(deck_id) = DeckId::parse(&id) else {
        return api_error_response(StatusCode::BAD_REQUEST, ApiError::invalid_param("id", &id));
    };
    if let Err(err) = snapshot.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(SaveResponse::failed(err.to_string())),
        )
            .into_response();
    }
    match state.store.replace_deck(&deck_id, &snapshot, unix_seconds()) {
        Ok(()) => Json(SaveResponse::ok()).into_response(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(SaveResponse::failed("deck not found")),
        )
            .into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn delete_deck_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let Ok(deck_id) = DeckId::parse(&id) else {
        return api_error_response(StatusCode::BAD_REQUEST, ApiError::invalid_param("id", &id));
    };
    // Idempotent: deleting an already absent deck still succeeds.
    match state.store.delete_deck(&deck_id) {
        Ok(_) => Json(SaveResponse::ok()).into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}

fn session_response(
    state: &AppState,
    status: StatusCode,
    user_id: &cardkeep_model::UserId,
    username: &str,
) -> Response {
    let claims = AuthClaims {
        user_id: user_id.clone(),
        username: username.to_string(),
        exp: unix_seconds() + state.config.token_ttl.as_secs(),
    };
    let Ok(token) = sign_session(&claims, state.config.auth_secret.as_bytes()) else {
        let request_id = state.next_request_id();
        tracing::error!(request_id, "session token signing failed");
        return api_error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal());
    };
    let cookie = session_cookie(
        &state.config.cookie_name,
        &token,
        state.config.token_ttl.as_secs(),
    );
    (
        status,
        [("set-cookie", cookie)],
        Json(json!({"user_id": user_id, "username": username})),
    )
        .into_response()
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Response {
    let mut field_errors = Vec::new();
    if body.username.trim().is_empty() {
        field_errors.push(json!({"field": "username", "reason": "required"}));
    }
    if body.username.contains('@') {
        field_errors.push(json!({"field": "username", "reason": "must not contain @"}));
    }
    if !body.email.contains('@') {
        field_errors.push(json!({"field": "email", "reason": "must be an email address"}));
    }
    if body.password.is_empty() {
        field_errors.push(json!({"field": "password", "reason": "required"}));
    }
    if !field_errors.is_empty() {
        return api_error_response(
            StatusCode::BAD_REQUEST,
            ApiError::validation_failed(json!(field_errors)),
        );
    }

    let salt = random_token();
    let hash = hash_password(&body.password, &salt);
    match state
        .store
        .create_user(body.username.trim(), body.email.trim(), &hash, &salt)
    {
        Ok(user) => {
            tracing::info!(username = %user.username, "account registered");
            session_response(&state, StatusCode::CREATED, &user.id, &user.username)
        }
        Err(err) => store_error_response(&state, &err),
    }
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Response {
    // The identity field takes an email or a username.
    let lookup = if body.username.contains('@') {
        state.store.find_user_by_email(&body.username)
    } else {
        state.store.find_user_by_username(&body.username)
    };
    let user = match lookup {
        Ok(user) => user,
        Err(err) => return store_error_response(&state, &err),
    };
    // Unknown account and wrong password produce the same response.
    match user {
        Some(user) if verify_password(&body.password, &user.password_salt, &user.password_hash) => {
            session_response(&state, StatusCode::OK, &user.id, &user.username)
        }
        _ => api_error_response(StatusCode::UNAUTHORIZED, ApiError::invalid_credentials()),
    }
}

pub(crate) async fn logout_handler(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(&state.config.cookie_name);
    ([("set-cookie", cookie)], Json(SaveResponse::ok())).into_response()
}

pub(crate) async fn request_reset_handler(
    State(state): State<AppState>,
    Json(body): Json<RequestResetBody>,
) -> Response {
    match state.store.find_user_by_email(body.email.trim()) {
        Ok(Some(user)) => {
            let token = random_token();
            let expires_at = unix_seconds() + state.config.reset_token_ttl.as_secs();
            if let Err(err) =
                state
                    .store
                    .create_reset_token(&user.id, &hash_reset_token(&token), expires_at)
            {
                return store_error_response(&state, &err);
            }
            let reset_url = format!("/reset?token={token}");
            if let Err(err) = state.mailer.send_reset_link(&user.email, &reset_url).await {
                let request_id = state.next_request_id();
                tracing::error!(request_id, error = %err, "reset mail delivery failed");
            }
        }
        Ok(None) => {
            tracing::debug!("reset requested for unknown email");
        }
        Err(err) => return store_error_response(&state, &err),
    }
    // Identical response whether or not the email exists.
    Json(SaveResponse::ok()).into_response()
}

pub(crate) async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> Response {
    if body.password.is_empty() {
        return api_error_response(
            StatusCode::BAD_REQUEST,
            ApiError::validation_failed(json!([{"field": "password", "reason": "required"}])),
        );
    }
    let user_id = match state
        .store
        .consume_reset_token(&hash_reset_token(&body.token), unix_seconds())
    {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            return api_error_response(
                StatusCode::BAD_REQUEST,
                ApiError::validation_failed(
                    json!([{"field": "token", "reason": "invalid or expired"}]),
                ),
            )
        }
        Err(err) => return store_error_response(&state, &err),
    };
    let salt = random_token();
    let hash = hash_password(&body.password, &salt);
    match state.store.update_password(&user_id, &hash, &salt) {
        Ok(()) => Json(SaveResponse::ok()).into_response(),
        Err(err) => store_error_response(&state, &err),
    }
}
