// SPDX-License-Identifier: Apache-2.0

use crate::{new_entity_id, Store, StoreError};
use cardkeep_model::{
    group_deck_lines, Deck, DeckId, DeckLine, DeckSnapshot, DeckView, UserId,
    DEFAULT_DECK_DESCRIPTION,
};
use rusqlite::{params, OptionalExtension};

const DECK_COLUMNS: &str = "id, name, description, user_id, cards, created_at, updated_at";

fn deck_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Deck> {
    let convert = |idx, e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e)
    };
    let id_raw: String = row.get(0)?;
    let user_raw: String = row.get(3)?;
    let cards_raw: String = row.get(4)?;
    Ok(Deck {
        id: DeckId::parse(&id_raw).map_err(|e| convert(0, Box::new(e)))?,
        name: row.get(1)?,
        description: row.get(2)?,
        user_id: UserId::parse(&user_raw).map_err(|e| convert(3, Box::new(e)))?,
        cards: serde_json::from_str::<Vec<DeckLine>>(&cards_raw)
            .map_err(|e| convert(4, Box::new(e)))?,
        created_at: row.get::<_, i64>(5)? as u64,
        updated_at: row.get::<_, i64>(6)? as u64,
    })
}

impl Store {
    /// Creates an empty deck. A missing description gets the editable
    /// placeholder text.
    pub fn create_deck(
        &self,
        user_id: &UserId,
        name: &str,
        description: Option<&str>,
        now: u64,
    ) -> Result<Deck, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("deck name must not be empty".to_string()));
        }
        let id = DeckId::parse(&new_entity_id("d"))
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let description = match description {
            Some(d) if !d.trim().is_empty() => d.to_string(),
            _ => DEFAULT_DECK_DESCRIPTION.to_string(),
        };
        let deck = Deck {
            id,
            name: name.to_string(),
            description,
            user_id: user_id.clone(),
            cards: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO decks (id, name, description, user_id, cards, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, '[]', ?5, ?5)",
            params![
                deck.id.as_str(),
                deck.name,
                deck.description,
                deck.user_id.as_str(),
                now as i64
            ],
        )?;
        Ok(deck)
    }

    pub fn get_deck(&self, id: &DeckId) -> Result<Option<Deck>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ?1");
        Ok(conn
            .query_row(&sql, params![id.as_str()], deck_from_row)
            .optional()?)
    }

    pub fn list_decks(&self) -> Result<Vec<Deck>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {DECK_COLUMNS} FROM decks ORDER BY created_at ASC, id ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], deck_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn decks_for_user(&self, user_id: &UserId) -> Result<Vec<Deck>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE user_id = ?1 ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str()], deck_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Replaces the stored document with the snapshot in one statement:
    /// name, description, and the entire line set. The snapshot must hold
    /// the deck line invariants; nothing invalid reaches the document
    /// column. Concurrent saves settle on whichever statement ran last.
    /// There is no ownership predicate here; the handler layer decides who
    /// may call this.
    pub fn replace_deck(
        &self,
        id: &DeckId,
        snapshot: &DeckSnapshot,
        now: u64,
    ) -> Result<(), StoreError> {
        snapshot
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        let lines: Vec<DeckLine> = snapshot
            .cards
            .iter()
            .map(|line| DeckLine {
                card_id: line.card_id.clone(),
                quantity: line.quantity,
            })
            .collect();
        let cards_json = serde_json::to_string(&lines)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE decks SET name = ?1, description = ?2, cards = ?3, updated_at = ?4 \
             WHERE id = ?5",
            params![
                snapshot.name,
                snapshot.description,
                cards_json,
                now as i64,
                id.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("deck"));
        }
        Ok(())
    }

    /// Deletes a deck. Returns whether a row existed; deleting an already
    /// absent deck is not an error.
    pub fn delete_deck(&self, id: &DeckId) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM decks WHERE id = ?1", params![id.as_str()])?;
        Ok(changed > 0)
    }

    /// Read path for deck pages: loads the deck, resolves its card ids
    /// against the catalog, and groups lines by card type.
    pub fn deck_view(&self, id: &DeckId) -> Result<Option<DeckView>, StoreError> {
        let Some(deck) = self.get_deck(id)? else {
            return Ok(None);
        };
        let ids: Vec<_> = deck.cards.iter().map(|l| l.card_id.clone()).collect();
        let catalog = self.cards_by_ids(&ids)?;
        Ok(Some(group_deck_lines(&deck, &catalog)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkeep_model::{CardId, SnapshotLine};

    fn snapshot(name: &str, lines: Vec<(&str, u32)>) -> DeckSnapshot {
        DeckSnapshot {
            name: name.to_string(),
            description: "desc".to_string(),
            cards: lines
                .into_iter()
                .map(|(id, quantity)| SnapshotLine {
                    card_id: CardId::parse(id).expect("card id"),
                    quantity,
                })
                .collect(),
        }
    }

    fn user() -> UserId {
        UserId::parse("u-test").expect("user id")
    }

    #[test]
    fn create_applies_placeholder_description_when_missing() {
        let store = Store::open_in_memory().expect("open");
        let deck = store.create_deck(&user(), "Saiyan Rush", None, 10).expect("create");
        assert_eq!(deck.description, DEFAULT_DECK_DESCRIPTION);
        assert!(deck.cards.is_empty());

        let custom = store
            .create_deck(&user(), "Namekian Wall", Some("Control deck"), 10)
            .expect("create");
        assert_eq!(custom.description, "Control deck");

        assert!(matches!(
            store.create_deck(&user(), "   ", None, 10),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn replace_then_fetch_returns_exactly_the_snapshot() {
        let store = Store::open_in_memory().expect("open");
        let deck = store.create_deck(&user(), "Saiyan Rush", None, 10).expect("create");
        store
            .replace_deck(&deck.id, &snapshot("Saiyan Rush v2", vec![("c1", 3), ("c2", 1)]), 20)
            .expect("replace");
        let loaded = store.get_deck(&deck.id).expect("query").expect("found");
        assert_eq!(loaded.name, "Saiyan Rush v2");
        assert_eq!(loaded.description, "desc");
        assert_eq!(loaded.cards.len(), 2);
        assert_eq!(loaded.cards[0].card_id.as_str(), "c1");
        assert_eq!(loaded.cards[0].quantity, 3);
        assert_eq!(loaded.updated_at, 20);
        assert_eq!(loaded.created_at, 10);
    }

    #[test]
    fn later_replace_overwrites_earlier_one_entirely() {
        let store = Store::open_in_memory().expect("open");
        let deck = store.create_deck(&user(), "Deck", None, 10).expect("create");
        store
            .replace_deck(&deck.id, &snapshot("Deck", vec![("c1", 4)]), 20)
            .expect("first save");
        store
            .replace_deck(&deck.id, &snapshot("Deck", vec![("c2", 1)]), 21)
            .expect("second save");
        let loaded = store.get_deck(&deck.id).expect("query").expect("found");
        // No merge: the first save's line is gone.
        assert_eq!(loaded.cards.len(), 1);
        assert_eq!(loaded.cards[0].card_id.as_str(), "c2");
    }

    #[test]
    fn replace_rejects_zero_quantity_and_duplicate_lines() {
        let store = Store::open_in_memory().expect("open");
        let deck = store.create_deck(&user(), "Deck", None, 10).expect("create");
        assert!(matches!(
            store.replace_deck(&deck.id, &snapshot("Deck", vec![("c1", 0)]), 20),
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store.replace_deck(&deck.id, &snapshot("Deck", vec![("c1", 1), ("c1", 2)]), 20),
            Err(StoreError::Invalid(_))
        ));
        // The stored document is untouched and still valid.
        let loaded = store.get_deck(&deck.id).expect("query").expect("found");
        assert!(loaded.cards.is_empty());
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn replace_missing_deck_is_not_found() {
        let store = Store::open_in_memory().expect("open");
        let ghost = DeckId::parse("d-missing").expect("id");
        assert!(matches!(
            store.replace_deck(&ghost, &snapshot("x", vec![]), 1),
            Err(StoreError::NotFound("deck"))
        ));
    }

    #[test]
    fn delete_reports_whether_the_deck_existed() {
        let store = Store::open_in_memory().expect("open");
        let deck = store.create_deck(&user(), "Deck", None, 10).expect("create");
        assert!(store.delete_deck(&deck.id).expect("delete"));
        assert!(!store.delete_deck(&deck.id).expect("delete again"));
        assert!(store.get_deck(&deck.id).expect("query").is_none());
    }

    #[test]
    fn listing_scopes_to_the_requested_user() {
        let store = Store::open_in_memory().expect("open");
        let other = UserId::parse("u-other").expect("user id");
        store.create_deck(&user(), "Mine", None, 10).expect("create");
        store.create_deck(&other, "Theirs", None, 11).expect("create");
        let mine = store.decks_for_user(&user()).expect("query");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Mine");
        assert_eq!(store.list_decks().expect("query").len(), 2);
    }

    #[test]
    fn deck_view_groups_lines_and_keeps_orphans() {
        use cardkeep_model::{CardRecord, CardStyle, CardType, Rarity};
        let store = Store::open_in_memory().expect("open");
        store
            .insert_card(&CardRecord {
                id: CardId::parse("c1").expect("id"),
                name: "Goku".to_string(),
                full_name: String::new(),
                title: "Super Saiyan".to_string(),
                style: CardStyle::Saiyan,
                card_type: CardType::Personality,
                rarity: Rarity::UltraRare,
                set: "Premiere".to_string(),
                card_level: 1,
                pur: 5,
                power_rating: Vec::new(),
                text: String::new(),
                limit_per_deck: 1,
                img_url: "/img/goku.jpg".to_string(),
                octgn_id: String::new(),
                card_number: String::new(),
            })
            .expect("insert");
        let deck = store.create_deck(&user(), "Deck", None, 10).expect("create");
        store
            .replace_deck(&deck.id, &snapshot("Deck", vec![("c1", 1), ("ghost", 2)]), 20)
            .expect("replace");

        let view = store.deck_view(&deck.id).expect("view").expect("found");
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].card_type, "Personality");
        assert_eq!(view.groups[0].entries[0].display_name, "Goku - Super Saiyan");
        assert_eq!(view.groups[1].card_type, "Unknown");
        assert_eq!(view.groups[1].entries[0].display_name, "ghost");

        let ghost_deck = DeckId::parse("d-missing").expect("id");
        assert!(store.deck_view(&ghost_deck).expect("view").is_none());
    }
}
