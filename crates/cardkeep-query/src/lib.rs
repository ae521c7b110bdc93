// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use cardkeep_model::{CardId, CardRecord, CardStyle, CardType, Rarity};
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "cardkeep-query";

mod parser;

pub use parser::{parse_search_query, sanitize_raw_query, RECOGNIZED_FIELDS};

/// Field-scoped catalog filters. All string filters are case-insensitive
/// substring matches; `level` is an exact match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardFilter {
    pub text: Option<String>,
    pub style: Option<String>,
    pub rarity: Option<String>,
    pub card_type: Option<String>,
    pub set: Option<String>,
    pub level: Option<i64>,
    /// Free-text remainder, matched against both name and title.
    pub name_or_title: Option<String>,
}

impl CardFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.style.is_none()
            && self.rarity.is_none()
            && self.card_type.is_none()
            && self.set.is_none()
            && self.level.is_none()
            && self.name_or_title.is_none()
    }
}

#[derive(Debug)]
pub struct QueryError(pub String);

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for QueryError {}

/// Canonical card column list, in the order [`card_from_row`] expects.
pub const CARD_COLUMNS: &str = "id, name, full_name, title, style, card_type, rarity, card_set, \
     card_level, pur, power_rating, text, limit_per_deck, img_url, octgn_id, card_number";

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == '%' || ch == '_' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn substring_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

/// Runs a filtered catalog search, sorted by (style, type, name, level)
/// ascending. An empty filter returns the whole catalog in sorted order;
/// callers that want the empty-query short-circuit check `is_empty` first.
pub fn search_cards(conn: &Connection, filter: &CardFilter) -> Result<Vec<CardRecord>, QueryError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<rusqlite::types::Value> = Vec::new();

    if let Some(v) = &filter.text {
        clauses.push("text LIKE ? ESCAPE '\\'".to_string());
        params.push(substring_pattern(v).into());
    }
    if let Some(v) = &filter.style {
        clauses.push("style LIKE ? ESCAPE '\\'".to_string());
        params.push(substring_pattern(v).into());
    }
    if let Some(v) = &filter.rarity {
        clauses.push("rarity LIKE ? ESCAPE '\\'".to_string());
        params.push(substring_pattern(v).into());
    }
    if let Some(v) = &filter.card_type {
        clauses.push("card_type LIKE ? ESCAPE '\\'".to_string());
        params.push(substring_pattern(v).into());
    }
    if let Some(v) = &filter.set {
        clauses.push("card_set LIKE ? ESCAPE '\\'".to_string());
        params.push(substring_pattern(v).into());
    }
    if let Some(v) = filter.level {
        clauses.push("card_level = ?".to_string());
        params.push(v.into());
    }
    if let Some(v) = &filter.name_or_title {
        clauses.push("(name LIKE ? ESCAPE '\\' OR title LIKE ? ESCAPE '\\')".to_string());
        let pattern = substring_pattern(v);
        params.push(pattern.clone().into());
        params.push(pattern.into());
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {CARD_COLUMNS} FROM cards{where_clause} \
         ORDER BY style ASC, card_type ASC, name ASC, card_level ASC"
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| QueryError(e.to_string()))?;
    let mapped = stmt
        .query_map(params_from_iter(params.iter()), card_from_row)
        .map_err(|e| QueryError(e.to_string()))?;
    mapped
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| QueryError(e.to_string()))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Maps one row of the canonical card column list to a [`CardRecord`].
/// Shared with the store crate, which selects the same columns.
pub fn card_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CardRecord> {
    let id_raw: String = row.get(0)?;
    let style_raw: String = row.get(4)?;
    let type_raw: String = row.get(5)?;
    let rarity_raw: String = row.get(6)?;
    let power_rating_raw: String = row.get(10)?;
    Ok(CardRecord {
        id: CardId::parse(&id_raw).map_err(|e| conversion_error(0, e))?,
        name: row.get(1)?,
        full_name: row.get(2)?,
        title: row.get(3)?,
        style: CardStyle::parse(&style_raw).map_err(|e| conversion_error(4, e))?,
        card_type: CardType::parse(&type_raw).map_err(|e| conversion_error(5, e))?,
        rarity: Rarity::parse(&rarity_raw).map_err(|e| conversion_error(6, e))?,
        set: row.get(7)?,
        card_level: row.get(8)?,
        pur: row.get(9)?,
        power_rating: serde_json::from_str(&power_rating_raw)
            .map_err(|e| conversion_error(10, e))?,
        text: row.get(11)?,
        limit_per_deck: row.get(12)?,
        img_url: row.get(13)?,
        octgn_id: row.get(14)?,
        card_number: row.get(15)?,
    })
}

#[cfg(test)]
mod sql_tests {
    use super::*;

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open sqlite");
        conn.execute_batch(
            "CREATE TABLE cards (
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
             INSERT INTO cards (id, name, title, style, card_type, rarity, card_set, card_level, text)
             VALUES
               ('c1', 'Goku', 'Super Saiyan', 'Saiyan', 'Personality', 'Ultra Rare', 'Movie Collection', 1, 'Constant combat power.'),
               ('c2', 'Goku', 'Calm and Ready', 'Saiyan', 'Personality', 'Rare', 'Premiere', 2, 'Raise your anger.'),
               ('c3', 'Earth Dragon Ball 4', '', 'Freestyle', 'Dragon Ball', 'Promo', 'Premiere', 0, 'Capture to win.'),
               ('c4', 'Blue Leverage', '', 'Blue', 'Physical Combat', 'Common', 'Premiere', 0, 'Physical attack.');",
        )
        .expect("seed cards");
        conn
    }

    #[test]
    fn empty_filter_returns_catalog_in_sort_order() {
        let conn = seeded_conn();
        let rows = search_cards(&conn, &CardFilter::default()).expect("search");
        let ids: Vec<&str> = rows.iter().map(|c| c.id.as_str()).collect();
        // Blue < Freestyle < Saiyan; within Saiyan/Personality, level 1 < 2.
        assert_eq!(ids, vec!["c4", "c3", "c1", "c2"]);
    }

    #[test]
    fn type_filter_is_case_insensitive_substring() {
        let conn = seeded_conn();
        let filter = CardFilter {
            card_type: Some("dragon".to_string()),
            ..CardFilter::default()
        };
        let rows = search_cards(&conn, &filter).expect("search");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "c3");
    }

    #[test]
    fn level_filter_is_exact() {
        let conn = seeded_conn();
        let filter = CardFilter {
            level: Some(2),
            ..CardFilter::default()
        };
        let rows = search_cards(&conn, &filter).expect("search");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "c2");
    }

    #[test]
    fn name_or_title_matches_either_field() {
        let conn = seeded_conn();
        let filter = CardFilter {
            name_or_title: Some("saiyan".to_string()),
            ..CardFilter::default()
        };
        let rows = search_cards(&conn, &filter).expect("search");
        // Matches the title of c1 only; names do not contain "saiyan".
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "c1");
    }

    #[test]
    fn filters_combine_conjunctively() {
        let conn = seeded_conn();
        let filter = CardFilter {
            set: Some("premiere".to_string()),
            name_or_title: Some("goku".to_string()),
            ..CardFilter::default()
        };
        let rows = search_cards(&conn, &filter).expect("search");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "c2");
    }

    #[test]
    fn like_metacharacters_in_values_are_literal() {
        let conn = seeded_conn();
        let filter = CardFilter {
            name_or_title: Some("%".to_string()),
            ..CardFilter::default()
        };
        let rows = search_cards(&conn, &filter).expect("search");
        assert!(rows.is_empty());
    }
}
