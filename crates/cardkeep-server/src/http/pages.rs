// SPDX-License-Identifier: Apache-2.0

//! Server-rendered HTML pages. Markup is assembled inline; everything that
//! originates from user input goes through `escape_html` first.

use crate::http::handlers::optional_session;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use cardkeep_api::parse_card_search_params;
use cardkeep_model::{Deck, DeckId, UserId};
use cardkeep_store::{hash_reset_token, unix_seconds};
use std::collections::BTreeMap;

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn page(title: &str, nav_user: Option<&str>, body: &str) -> Html<String> {
    let nav = match nav_user {
        Some(username) => format!(
            "<a href=\"/dashboard\">{}</a>",
            escape_html(username)
        ),
        None => "<a href=\"/login\">Log in</a> <a href=\"/register\">Register</a>".to_string(),
    };
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\
<nav><a href=\"/\">Cardkeep</a> <a href=\"/cards\">Cards</a> <a href=\"/decks\">Decks</a> {nav}</nav>\
{body}\
</body></html>",
        escape_html(title)
    ))
}

fn not_found_page(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        page("Not found", None, &format!("<h1>{} not found</h1>", escape_html(what))),
    )
        .into_response()
}

fn deck_list_items(decks: &[Deck]) -> String {
    let mut list = String::new();
    for deck in decks {
        list.push_str(&format!(
            "<li><a href=\"/decks/{}\">{}</a> ({} cards)</li>",
            escape_html(deck.id.as_str()),
            escape_html(&deck.name),
            deck.cards.iter().map(|l| u64::from(l.quantity)).sum::<u64>()
        ));
    }
    if list.is_empty() {
        list.push_str("<li>No decks yet.</li>");
    }
    list
}

pub(crate) async fn landing_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let session = optional_session(&state, &headers);
    let body = format!(
        "<h1>Cardkeep</h1>\
<p>Version: <code>{}</code></p>\
<p>Browse the <a href=\"/cards\">card catalog</a> or the <a href=\"/decks\">community decks</a>.</p>",
        env!("CARGO_PKG_VERSION")
    );
    page("Cardkeep", session.as_ref().map(|c| c.username.as_str()), &body).into_response()
}

pub(crate) async fn catalog_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let session = optional_session(&state, &headers);
    let raw_q = query.get("q").cloned().unwrap_or_default();
    let params = match parse_card_search_params(&query) {
        Ok(params) => params,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                page("Cards", None, "<h1>Invalid search</h1>"),
            )
                .into_response()
        }
    };
    let cards = if params.empty_query {
        Vec::new()
    } else {
        match state.store.search_cards(&params.filter) {
            Ok(cards) => cards,
            Err(err) => {
                tracing::error!(error = %err, "catalog page search failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    page("Cards", None, "<h1>Something went wrong</h1>"),
                )
                    .into_response();
            }
        }
    };

    let mut rows = String::new();
    for card in &cards {
        rows.push_str(&format!(
            "<tr><td><a href=\"/api/cards/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(card.id.as_str()),
            escape_html(&card.display_name()),
            card.style.as_str(),
            card.card_type.as_str(),
            card.rarity.as_str(),
            card.card_level
        ));
    }
    if rows.is_empty() {
        rows.push_str("<tr><td colspan=\"5\">No cards matched.</td></tr>");
    }
    let body = format!(
        "<h1>Card Catalog</h1>\
<form method=\"get\" action=\"/cards\">\
<input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"style:Saiyan type:&quot;Physical Combat&quot; goku\">\
<button type=\"submit\">Search</button></form>\
<table><tr><th>Card</th><th>Style</th><th>Type</th><th>Rarity</th><th>Level</th></tr>{rows}</table>",
        escape_html(&raw_q)
    );
    page("Cards", session.as_ref().map(|c| c.username.as_str()), &body).into_response()
}

pub(crate) async fn decks_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let session = optional_session(&state, &headers);
    let decks = match state.store.list_decks() {
        Ok(decks) => decks,
        Err(err) => {
            tracing::error!(error = %err, "deck listing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                page("Decks", None, "<h1>Something went wrong</h1>"),
            )
                .into_response();
        }
    };
    let body = format!("<h1>Decks</h1><ul>{}</ul>", deck_list_items(&decks));
    page("Decks", session.as_ref().map(|c| c.username.as_str()), &body).into_response()
}

pub(crate) async fn deck_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = optional_session(&state, &headers);
    let Ok(deck_id) = DeckId::parse(&id) else {
        return not_found_page("Deck");
    };
    let view = match state.store.deck_view(&deck_id) {
        Ok(Some(view)) => view,
        Ok(None) => return not_found_page("Deck"),
        Err(err) => {
            tracing::error!(error = %err, "deck page load failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                page("Deck", None, "<h1>Something went wrong</h1>"),
            )
                .into_response();
        }
    };

    let mut sections = String::new();
    for group in &view.groups {
        sections.push_str(&format!("<h2>{}</h2><ul>", escape_html(&group.card_type)));
        for entry in &group.entries {
            let img = if entry.img_url.is_empty() {
                String::new()
            } else {
                format!(
                    " <img src=\"{}\" alt=\"\" height=\"40\">",
                    escape_html(&entry.img_url)
                )
            };
            sections.push_str(&format!(
                "<li>{}x {}{img}</li>",
                entry.quantity,
                escape_html(&entry.display_name)
            ));
        }
        sections.push_str("</ul>");
    }
    if sections.is_empty() {
        sections.push_str("<p>This deck is empty.</p>");
    }
    let edit_link = if session.is_some() {
        format!(
            "<p><a href=\"/decks/{}/edit\">Edit this deck</a></p>",
            escape_html(view.id.as_str())
        )
    } else {
        String::new()
    };
    let body = format!(
        "<h1>{}</h1><p>{}</p><p>By <a href=\"/users/{}\">{}</a></p>{edit_link}{sections}",
        escape_html(&view.name),
        escape_html(&view.description),
        escape_html(view.user_id.as_str()),
        escape_html(view.user_id.as_str()),
    );
    page(&view.name, session.as_ref().map(|c| c.username.as_str()), &body).into_response()
}

/// Editor page. Mutations go through the JSON API with a full snapshot per
/// save; the page only seeds the client with the current document.
pub(crate) async fn deck_editor_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(session) = optional_session(&state, &headers) else {
        return Redirect::to("/login").into_response();
    };
    let Ok(deck_id) = DeckId::parse(&id) else {
        return not_found_page("Deck");
    };
    let deck = match state.store.get_deck(&deck_id) {
        Ok(Some(deck)) => deck,
        Ok(None) => return not_found_page("Deck"),
        Err(err) => {
            tracing::error!(error = %err, "deck editor load failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                page("Deck editor", None, "<h1>Something went wrong</h1>"),
            )
                .into_response();
        }
    };
    let deck_json = serde_json::to_string(&deck).unwrap_or_else(|_| "null".to_string());
    let body = format!(
        "<h1>Editing: {}</h1>\
<div id=\"editor\" data-deck-id=\"{}\"></div>\
<script>\
const deck = {deck_json};\
function save() {{\
  const snapshot = {{name: deck.name, description: deck.description, cards: deck.cards}};\
  fetch('/api/decks/' + deck.id, {{method: 'PUT', headers: {{'content-type': 'application/json'}}, body: JSON.stringify(snapshot)}});\
}}\
function addCard(cardId) {{\
  const line = deck.cards.find(l => l.card_id === cardId);\
  if (line) {{ line.quantity += 1; }} else {{ deck.cards.push({{card_id: cardId, quantity: 1}}); }}\
  save();\
}}\
function removeCard(cardId) {{\
  const idx = deck.cards.findIndex(l => l.card_id === cardId);\
  if (idx < 0) return;\
  if (deck.cards[idx].quantity > 1) {{ deck.cards[idx].quantity -= 1; }} else {{ deck.cards.splice(idx, 1); }}\
  save();\
}}\
</script>",
        escape_html(&deck.name),
        escape_html(deck.id.as_str()),
    );
    page("Deck editor", Some(session.username.as_str()), &body).into_response()
}

pub(crate) async fn user_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = optional_session(&state, &headers);
    let Ok(user_id) = UserId::parse(&id) else {
        return not_found_page("User");
    };
    let user = match state.store.get_user(&user_id) {
        Ok(Some(user)) => user,
        Ok(None) => return not_found_page("User"),
        Err(err) => {
            tracing::error!(error = %err, "user page load failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                page("User", None, "<h1>Something went wrong</h1>"),
            )
                .into_response();
        }
    };
    let decks = state.store.decks_for_user(&user.id).unwrap_or_default();
    let body = format!(
        "<h1>{}</h1><h2>Decks</h2><ul>{}</ul>",
        escape_html(&user.username),
        deck_list_items(&decks)
    );
    page(
        &user.username,
        session.as_ref().map(|c| c.username.as_str()),
        &body,
    )
    .into_response()
}

pub(crate) async fn dashboard_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let Some(session) = optional_session(&state, &headers) else {
        return Redirect::to("/login").into_response();
    };
    let decks = match state.store.decks_for_user(&session.user_id) {
        Ok(decks) => decks,
        Err(err) => {
            tracing::error!(error = %err, "dashboard load failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                page("Dashboard", None, "<h1>Something went wrong</h1>"),
            )
                .into_response();
        }
    };
    let body = format!(
        "<h1>Your decks</h1><ul>{}</ul>\
<form id=\"new-deck\"><input type=\"text\" name=\"name\" placeholder=\"New deck name\">\
<button type=\"submit\">Create</button></form>\
<script>\
document.getElementById('new-deck').addEventListener('submit', async (e) => {{\
  e.preventDefault();\
  const name = e.target.elements.name.value;\
  const res = await fetch('/api/decks', {{method: 'POST', headers: {{'content-type': 'application/json'}}, body: JSON.stringify({{name}})}});\
  if (res.ok) {{ const deck = await res.json(); window.location = '/decks/' + deck.id + '/edit'; }}\
}});\
</script>",
        deck_list_items(&decks)
    );
    page("Dashboard", Some(session.username.as_str()), &body).into_response()
}

pub(crate) async fn login_page_handler() -> Html<String> {
    page(
        "Log in",
        None,
        "<h1>Log in</h1>\
<form id=\"login\"><input name=\"username\" placeholder=\"Username or email\">\
<input name=\"password\" type=\"password\" placeholder=\"Password\">\
<button type=\"submit\">Log in</button></form>\
<p><a href=\"/reset\">Forgot your password?</a></p>\
<script>\
document.getElementById('login').addEventListener('submit', async (e) => {\
  e.preventDefault();\
  const body = {username: e.target.elements.username.value, password: e.target.elements.password.value};\
  const res = await fetch('/api/users/login', {method: 'POST', headers: {'content-type': 'application/json'}, body: JSON.stringify(body)});\
  if (res.ok) { window.location = '/dashboard'; } else { alert('Invalid credentials'); }\
});\
</script>",
    )
}

pub(crate) async fn register_page_handler() -> Html<String> {
    page(
        "Register",
        None,
        "<h1>Register</h1>\
<form id=\"register\"><input name=\"username\" placeholder=\"Username\">\
<input name=\"email\" type=\"email\" placeholder=\"Email\">\
<input name=\"password\" type=\"password\" placeholder=\"Password\">\
<button type=\"submit\">Register</button></form>\
<script>\
document.getElementById('register').addEventListener('submit', async (e) => {\
  e.preventDefault();\
  const f = e.target.elements;\
  const body = {username: f.username.value, email: f.email.value, password: f.password.value};\
  const res = await fetch('/api/users/register', {method: 'POST', headers: {'content-type': 'application/json'}, body: JSON.stringify(body)});\
  if (res.ok) { window.location = '/dashboard'; }\
});\
</script>",
    )
}

/// With a live `token` query parameter this renders the new-password form.
/// The token is pre-validated without being consumed, so a stale link
/// lands on the request-a-link form instead of failing after the user has
/// typed a new password.
pub(crate) async fn reset_page_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Html<String> {
    let live_token = match query.get("token") {
        Some(token) => {
            match state
                .store
                .peek_reset_token(&hash_reset_token(token), unix_seconds())
            {
                Ok(Some(_)) => Some(token),
                Ok(None) => None,
                Err(err) => {
                    tracing::error!(error = %err, "reset token lookup failed");
                    None
                }
            }
        }
        None => None,
    };
    let body = match live_token {
        Some(token) => format!(
            "<h1>Choose a new password</h1>\
<form id=\"reset\"><input name=\"password\" type=\"password\" placeholder=\"New password\">\
<button type=\"submit\">Reset</button></form>\
<script>\
document.getElementById('reset').addEventListener('submit', async (e) => {{\
  e.preventDefault();\
  const body = {{token: '{}', password: e.target.elements.password.value}};\
  const res = await fetch('/api/users/reset-password', {{method: 'POST', headers: {{'content-type': 'application/json'}}, body: JSON.stringify(body)}});\
  if (res.ok) {{ window.location = '/login'; }} else {{ alert('Reset link is invalid or expired'); }}\
}});\
</script>",
            escape_html(token)
        ),
        None => {
            let mut body = "<h1>Reset your password</h1>".to_string();
            if query.contains_key("token") {
                body.push_str(
                    "<p>That reset link is invalid or has expired. Request a new one below.</p>",
                );
            }
            body.push_str(
                "<form id=\"request\"><input name=\"email\" type=\"email\" placeholder=\"Email\">\
<button type=\"submit\">Send reset link</button></form>\
<script>\
document.getElementById('request').addEventListener('submit', async (e) => {\
  e.preventDefault();\
  const body = {email: e.target.elements.email.value};\
  await fetch('/api/users/request-reset', {method: 'POST', headers: {'content-type': 'application/json'}, body: JSON.stringify(body)});\
  alert('If that address is registered, a reset link is on its way.');\
});\
</script>",
            );
            body
        }
    };
    page("Reset password", None, &body)
}
