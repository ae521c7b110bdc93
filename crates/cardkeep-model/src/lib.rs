// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "cardkeep-model";

mod card;
mod deck;
mod ids;
mod user;

pub use card::{CardRecord, CardStyle, CardType, Rarity, NAME_MAX_LEN};
pub use deck::{
    group_deck_lines, Deck, DeckLine, DeckSnapshot, DeckValidationError, DeckView, DeckViewEntry,
    DeckViewGroup, SnapshotLine, DEFAULT_DECK_DESCRIPTION,
};
pub use ids::{CardId, DeckId, ParseError, UserId, ID_MAX_LEN};
pub use user::User;
