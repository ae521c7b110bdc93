// SPDX-License-Identifier: Apache-2.0

/// Bootstrap DDL, applied on every open. All statements are idempotent.
/// The `cards` column list and order must stay in sync with
/// `cardkeep_query::CARD_COLUMNS`.
pub(crate) const SCHEMA_SQL: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    password_salt TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL DEFAULT '',
    title TEXT NOT NULL DEFAULT '',
    style TEXT NOT NULL,
    card_type TEXT NOT NULL,
    rarity TEXT NOT NULL,
    card_set TEXT NOT NULL DEFAULT '',
    card_level INTEGER NOT NULL DEFAULT 0,
    pur INTEGER NOT NULL DEFAULT 0,
    power_rating TEXT NOT NULL DEFAULT '[]',
    text TEXT NOT NULL DEFAULT '',
    limit_per_deck INTEGER NOT NULL DEFAULT 3,
    img_url TEXT NOT NULL DEFAULT '',
    octgn_id TEXT NOT NULL DEFAULT '',
    card_number TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_cards_sort
    ON cards (style, card_type, name, card_level);

CREATE TABLE IF NOT EXISTS decks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    user_id TEXT NOT NULL,
    cards TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_decks_user ON decks (user_id);

CREATE TABLE IF NOT EXISTS reset_tokens (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);
";
