// SPDX-License-Identifier: Apache-2.0

//! The deck editor model: an explicit in-memory reflection of a deck,
//! mutated by discrete user actions, with each mutation producing a
//! full-state snapshot for a fire-and-forget save.
//!
//! The model is the source of truth for the save payload; rendering is a
//! projection over it. Saves are not queued or cancelled: overlapping saves
//! race and the last response wins, so the rendered and persisted state may
//! transiently diverge under rapid consecutive mutations.

#![forbid(unsafe_code)]

use cardkeep_model::{CardId, DeckSnapshot, SnapshotLine};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "cardkeep-editor";

/// The catalog details the editor needs to carry per line; everything else
/// about a card stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorCard {
    pub card_id: CardId,
    pub display_name: String,
    pub card_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorLine {
    pub card: EditorCard,
    pub quantity: u32,
}

/// Save-synchronization state. Any mutation moves the editor to `Saving`;
/// `in_flight` counts overlapping saves since nothing blocks further edits
/// while a request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    Idle,
    Saving { in_flight: u32 },
}

/// Outcome of a single mutation, for callers that mirror it into a view.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditOutcome {
    Added,
    Incremented(u32),
    Decremented(u32),
    Removed,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEditor {
    name: String,
    description: String,
    lines: Vec<EditorLine>,
    sync: SyncState,
}

impl DeckEditor {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            lines: Vec::new(),
            sync: SyncState::Idle,
        }
    }

    /// Rehydrates an editor from stored lines, preserving their order.
    #[must_use]
    pub fn from_lines(
        name: impl Into<String>,
        description: impl Into<String>,
        lines: Vec<EditorLine>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            lines,
            sync: SyncState::Idle,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn lines(&self) -> &[EditorLine] {
        &self.lines
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> DeckSnapshot {
        self.name = name.into();
        self.begin_save()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> DeckSnapshot {
        self.description = description.into();
        self.begin_save()
    }

    /// Adds a card: an existing line gains one copy, otherwise a fresh line
    /// with quantity 1 is appended. Always triggers a snapshot save.
    pub fn add(&mut self, card: EditorCard) -> (EditOutcome, DeckSnapshot) {
        let outcome = match self.line_index(&card.card_id) {
            Some(idx) => {
                self.lines[idx].quantity += 1;
                EditOutcome::Incremented(self.lines[idx].quantity)
            }
            None => {
                self.lines.push(EditorLine { card, quantity: 1 });
                EditOutcome::Added
            }
        };
        (outcome, self.begin_save())
    }

    /// Quantity += 1 for an existing line; unknown ids are a no-op and do
    /// not trigger a save.
    pub fn increase(&mut self, card_id: &CardId) -> (EditOutcome, Option<DeckSnapshot>) {
        match self.line_index(card_id) {
            Some(idx) => {
                self.lines[idx].quantity += 1;
                let quantity = self.lines[idx].quantity;
                (EditOutcome::Incremented(quantity), Some(self.begin_save()))
            }
            None => (EditOutcome::NoOp, None),
        }
    }

    /// Quantity -= 1, delegating to `remove` at quantity 1 so a line never
    /// exists with quantity 0.
    pub fn decrease(&mut self, card_id: &CardId) -> (EditOutcome, Option<DeckSnapshot>) {
        match self.line_index(card_id) {
            Some(idx) if self.lines[idx].quantity > 1 => {
                self.lines[idx].quantity -= 1;
                let quantity = self.lines[idx].quantity;
                (EditOutcome::Decremented(quantity), Some(self.begin_save()))
            }
            Some(_) => self.remove(card_id),
            None => (EditOutcome::NoOp, None),
        }
    }

    /// Deletes the whole line regardless of quantity.
    pub fn remove(&mut self, card_id: &CardId) -> (EditOutcome, Option<DeckSnapshot>) {
        match self.line_index(card_id) {
            Some(idx) => {
                self.lines.remove(idx);
                (EditOutcome::Removed, Some(self.begin_save()))
            }
            None => (EditOutcome::NoOp, None),
        }
    }

    /// The full current line set plus name/description, sent as a complete
    /// replacement. Never a diff; no version token.
    #[must_use]
    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            name: self.name.clone(),
            description: self.description.clone(),
            cards: self
                .lines
                .iter()
                .map(|line| SnapshotLine {
                    card_id: line.card.card_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
        }
    }

    /// Lines grouped by card type in first-seen order, for rendering. A
    /// group disappears as soon as its last line is removed.
    #[must_use]
    pub fn grouped(&self) -> Vec<(String, Vec<&EditorLine>)> {
        let mut groups: Vec<(String, Vec<&EditorLine>)> = Vec::new();
        for line in &self.lines {
            match groups.iter_mut().find(|(t, _)| *t == line.card.card_type) {
                Some((_, entries)) => entries.push(line),
                None => groups.push((line.card.card_type.clone(), vec![line])),
            }
        }
        groups
    }

    /// Acknowledges one save response. Responses are not ordered; the
    /// editor only tracks how many are still outstanding.
    pub fn complete_save(&mut self) {
        self.sync = match self.sync {
            SyncState::Saving { in_flight } if in_flight > 1 => SyncState::Saving {
                in_flight: in_flight - 1,
            },
            _ => SyncState::Idle,
        };
    }

    fn begin_save(&mut self) -> DeckSnapshot {
        self.sync = match self.sync {
            SyncState::Idle => SyncState::Saving { in_flight: 1 },
            SyncState::Saving { in_flight } => SyncState::Saving {
                in_flight: in_flight + 1,
            },
        };
        self.snapshot()
    }

    fn line_index(&self, card_id: &CardId) -> Option<usize> {
        self.lines.iter().position(|l| &l.card.card_id == card_id)
    }
}
