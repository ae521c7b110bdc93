// SPDX-License-Identifier: Apache-2.0

use crate::{Store, StoreError};
use cardkeep_model::{CardId, CardRecord};
use cardkeep_query::{card_from_row, search_cards, CardFilter, CARD_COLUMNS};
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

impl Store {
    /// Inserts a catalog card. The record must already pass
    /// `CardRecord::validate`; the id must be new.
    pub fn insert_card(&self, card: &CardRecord) -> Result<(), StoreError> {
        let power_rating = serde_json::to_string(&card.power_rating)?;
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO cards (id, name, full_name, title, style, card_type, rarity, \
             card_set, card_level, pur, power_rating, text, limit_per_deck, img_url, \
             octgn_id, card_number) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                card.id.as_str(),
                card.name,
                card.full_name,
                card.title,
                card.style.as_str(),
                card.card_type.as_str(),
                card.rarity.as_str(),
                card.set,
                card.card_level,
                card.pur,
                power_rating,
                card.text,
                card.limit_per_deck,
                card.img_url,
                card.octgn_id,
                card.card_number
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate("card"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_card(&self, id: &CardId) -> Result<Option<CardRecord>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1");
        Ok(conn
            .query_row(&sql, params![id.as_str()], card_from_row)
            .optional()?)
    }

    /// Resolves a batch of card ids. Missing ids are simply absent from the
    /// result; deck rendering treats them as orphan references.
    pub fn cards_by_ids(
        &self,
        ids: &[CardId],
    ) -> Result<HashMap<CardId, CardRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id IN ({placeholders})");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(ids.iter().map(CardId::as_str)),
            card_from_row,
        )?;
        let mut out = HashMap::with_capacity(ids.len());
        for row in rows {
            let card = row?;
            out.insert(card.id.clone(), card);
        }
        Ok(out)
    }

    /// Filtered catalog search in the fixed (style, type, name, level) sort
    /// order. An empty filter returns the whole catalog.
    pub fn search_cards(&self, filter: &CardFilter) -> Result<Vec<CardRecord>, StoreError> {
        let conn = self.conn()?;
        Ok(search_cards(&conn, filter)?)
    }
}
