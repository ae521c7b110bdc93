// SPDX-License-Identifier: Apache-2.0

use crate::card::CardRecord;
use crate::ids::{CardId, DeckId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

pub const DEFAULT_DECK_DESCRIPTION: &str = "Edit your deck's description here";

/// One (card, quantity) pair inside a deck. Quantity is always >= 1; a line
/// that would drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeckLine {
    pub card_id: CardId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckValidationError {
    EmptyName,
    ZeroQuantity(CardId),
    DuplicateCard(CardId),
}

impl Display for DeckValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => f.write_str("deck name must not be empty"),
            Self::ZeroQuantity(id) => write!(f, "deck line for {id} has zero quantity"),
            Self::DuplicateCard(id) => write!(f, "deck contains duplicate line for {id}"),
        }
    }
}

impl std::error::Error for DeckValidationError {}

/// A stored deck document. Lines keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub description: String,
    pub user_id: UserId,
    pub cards: Vec<DeckLine>,
    pub created_at: u64,
    pub updated_at: u64,
}

fn validate_lines<'a>(
    name: &str,
    lines: impl Iterator<Item = (&'a CardId, u32)>,
) -> Result<(), DeckValidationError> {
    if name.trim().is_empty() {
        return Err(DeckValidationError::EmptyName);
    }
    let mut seen: HashMap<&CardId, ()> = HashMap::new();
    for (card_id, quantity) in lines {
        if quantity == 0 {
            return Err(DeckValidationError::ZeroQuantity(card_id.clone()));
        }
        if seen.insert(card_id, ()).is_some() {
            return Err(DeckValidationError::DuplicateCard(card_id.clone()));
        }
    }
    Ok(())
}

impl Deck {
    pub fn validate(&self) -> Result<(), DeckValidationError> {
        validate_lines(&self.name, self.cards.iter().map(|l| (&l.card_id, l.quantity)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotLine {
    pub card_id: CardId,
    pub quantity: u32,
}

/// The full-replacement payload the editor sends on every mutation: the
/// entire line set plus current name/description, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeckSnapshot {
    pub name: String,
    pub description: String,
    pub cards: Vec<SnapshotLine>,
}

impl DeckSnapshot {
    /// Same invariants as a stored deck: non-empty name, quantity >= 1,
    /// one line per card id. Checked before the snapshot replaces the
    /// document.
    pub fn validate(&self) -> Result<(), DeckValidationError> {
        validate_lines(&self.name, self.cards.iter().map(|l| (&l.card_id, l.quantity)))
    }
}

/// One rendered deck line: resolved display name plus catalog details when
/// the referenced card still exists. Orphan references render with the raw id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckViewEntry {
    pub card_id: CardId,
    pub display_name: String,
    pub quantity: u32,
    pub img_url: String,
    pub card_level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckViewGroup {
    pub card_type: String,
    pub entries: Vec<DeckViewEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckView {
    pub id: DeckId,
    pub name: String,
    pub description: String,
    pub user_id: UserId,
    pub groups: Vec<DeckViewGroup>,
    pub updated_at: u64,
}

/// Groups deck lines by card type for presentation, preserving line insertion
/// order within each group and first-seen order across groups. A pure
/// projection; the stored document stays flat.
#[must_use]
pub fn group_deck_lines(deck: &Deck, catalog: &HashMap<CardId, CardRecord>) -> DeckView {
    let mut groups: Vec<DeckViewGroup> = Vec::new();
    let mut index_by_type: HashMap<String, usize> = HashMap::new();

    for line in &deck.cards {
        let (type_name, entry) = match catalog.get(&line.card_id) {
            Some(card) => (
                card.card_type.as_str().to_string(),
                DeckViewEntry {
                    card_id: line.card_id.clone(),
                    display_name: card.display_name(),
                    quantity: line.quantity,
                    img_url: card.img_url.replace('\'', "%27"),
                    card_level: card.card_level,
                },
            ),
            None => (
                "Unknown".to_string(),
                DeckViewEntry {
                    card_id: line.card_id.clone(),
                    display_name: line.card_id.as_str().to_string(),
                    quantity: line.quantity,
                    img_url: String::new(),
                    card_level: 0,
                },
            ),
        };
        let idx = match index_by_type.get(&type_name) {
            Some(idx) => *idx,
            None => {
                groups.push(DeckViewGroup {
                    card_type: type_name.clone(),
                    entries: Vec::new(),
                });
                let idx = groups.len() - 1;
                index_by_type.insert(type_name, idx);
                idx
            }
        };
        groups[idx].entries.push(entry);
    }

    DeckView {
        id: deck.id.clone(),
        name: deck.name.clone(),
        description: deck.description.clone(),
        user_id: deck.user_id.clone(),
        groups,
        updated_at: deck.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardStyle, CardType, Rarity};

    fn card(id: &str, name: &str, card_type: CardType) -> CardRecord {
        CardRecord {
            id: CardId::parse(id).expect("card id"),
            name: name.to_string(),
            full_name: String::new(),
            title: String::new(),
            style: CardStyle::default(),
            card_type,
            rarity: Rarity::default(),
            set: String::new(),
            card_level: 0,
            pur: 0,
            power_rating: Vec::new(),
            text: String::new(),
            limit_per_deck: 3,
            img_url: format!("/img/{id}.jpg"),
            octgn_id: String::new(),
            card_number: String::new(),
        }
    }

    fn deck(lines: Vec<(&str, u32)>) -> Deck {
        Deck {
            id: DeckId::parse("d1").expect("deck id"),
            name: "Test".to_string(),
            description: DEFAULT_DECK_DESCRIPTION.to_string(),
            user_id: UserId::parse("u1").expect("user id"),
            cards: lines
                .into_iter()
                .map(|(id, quantity)| DeckLine {
                    card_id: CardId::parse(id).expect("card id"),
                    quantity,
                })
                .collect(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn validate_rejects_duplicate_lines_and_zero_quantity() {
        assert!(deck(vec![("c1", 1), ("c2", 2)]).validate().is_ok());
        assert!(matches!(
            deck(vec![("c1", 1), ("c1", 2)]).validate(),
            Err(DeckValidationError::DuplicateCard(_))
        ));
        assert!(matches!(
            deck(vec![("c1", 0)]).validate(),
            Err(DeckValidationError::ZeroQuantity(_))
        ));
        let mut d = deck(vec![]);
        d.name = "  ".to_string();
        assert!(matches!(
            d.validate(),
            Err(DeckValidationError::EmptyName)
        ));
    }

    #[test]
    fn snapshot_validate_enforces_the_same_line_invariants() {
        let snapshot = |name: &str, lines: Vec<(&str, u32)>| DeckSnapshot {
            name: name.to_string(),
            description: String::new(),
            cards: lines
                .into_iter()
                .map(|(id, quantity)| SnapshotLine {
                    card_id: CardId::parse(id).expect("card id"),
                    quantity,
                })
                .collect(),
        };
        assert!(snapshot("Test", vec![("c1", 1), ("c2", 4)]).validate().is_ok());
        assert!(matches!(
            snapshot("Test", vec![("c1", 0)]).validate(),
            Err(DeckValidationError::ZeroQuantity(_))
        ));
        assert!(matches!(
            snapshot("Test", vec![("c1", 1), ("c1", 1)]).validate(),
            Err(DeckValidationError::DuplicateCard(_))
        ));
        assert!(matches!(
            snapshot(" ", vec![]).validate(),
            Err(DeckValidationError::EmptyName)
        ));
    }

    #[test]
    fn grouping_preserves_insertion_order_and_composes_display_names() {
        let mut catalog = HashMap::new();
        let mut goku = card("c1", "Goku", CardType::Personality);
        goku.title = "Super Saiyan".to_string();
        catalog.insert(goku.id.clone(), goku);
        let drill = card("c2", "Power Drill", CardType::Drill);
        catalog.insert(drill.id.clone(), drill);
        let vegeta = card("c3", "Vegeta", CardType::Personality);
        catalog.insert(vegeta.id.clone(), vegeta);

        let view = group_deck_lines(&deck(vec![("c1", 2), ("c2", 1), ("c3", 3)]), &catalog);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].card_type, "Personality");
        assert_eq!(view.groups[0].entries.len(), 2);
        assert_eq!(view.groups[0].entries[0].display_name, "Goku - Super Saiyan");
        assert_eq!(view.groups[0].entries[0].quantity, 2);
        assert_eq!(view.groups[1].card_type, "Drill");
    }

    #[test]
    fn grouping_renders_orphan_references_under_unknown() {
        let catalog = HashMap::new();
        let view = group_deck_lines(&deck(vec![("ghost", 1)]), &catalog);
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].card_type, "Unknown");
        assert_eq!(view.groups[0].entries[0].display_name, "ghost");
    }

    #[test]
    fn grouping_escapes_single_quotes_in_image_urls() {
        let mut catalog = HashMap::new();
        let mut c = card("c1", "King Kai's Telepathy", CardType::Event);
        c.img_url = "/img/king kai's telepathy.jpg".to_string();
        catalog.insert(c.id.clone(), c);
        let view = group_deck_lines(&deck(vec![("c1", 1)]), &catalog);
        assert_eq!(
            view.groups[0].entries[0].img_url,
            "/img/king kai%27s telepathy.jpg"
        );
    }
}
