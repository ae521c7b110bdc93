// SPDX-License-Identifier: Apache-2.0

use crate::ids::{CardId, ParseError};
use serde::{Deserialize, Serialize};

pub const NAME_MAX_LEN: usize = 256;

/// Card combat style. `Freestyle` is the catalog default for cards imported
/// without an explicit style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CardStyle {
    Black,
    Blue,
    Freestyle,
    Namekian,
    #[serde(rename = "Non-Styled")]
    NonStyled,
    Orange,
    Red,
    Saiyan,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self::Freestyle
    }
}

impl CardStyle {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "Black" => Ok(Self::Black),
            "Blue" => Ok(Self::Blue),
            "Freestyle" => Ok(Self::Freestyle),
            "Namekian" => Ok(Self::Namekian),
            "Non-Styled" => Ok(Self::NonStyled),
            "Orange" => Ok(Self::Orange),
            "Red" => Ok(Self::Red),
            "Saiyan" => Ok(Self::Saiyan),
            _ => Err(ParseError::InvalidFormat("unknown card style")),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "Black",
            Self::Blue => "Blue",
            Self::Freestyle => "Freestyle",
            Self::Namekian => "Namekian",
            Self::NonStyled => "Non-Styled",
            Self::Orange => "Orange",
            Self::Red => "Red",
            Self::Saiyan => "Saiyan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CardType {
    Ally,
    #[serde(rename = "Dragon Ball")]
    DragonBall,
    Drill,
    #[serde(rename = "Energy Combat")]
    EnergyCombat,
    Event,
    Mastery,
    Personality,
    #[serde(rename = "Physical Combat")]
    PhysicalCombat,
    Setup,
    #[serde(rename = "No Type")]
    NoType,
}

impl Default for CardType {
    fn default() -> Self {
        Self::NoType
    }
}

impl CardType {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "Ally" => Ok(Self::Ally),
            "Dragon Ball" => Ok(Self::DragonBall),
            "Drill" => Ok(Self::Drill),
            "Energy Combat" => Ok(Self::EnergyCombat),
            "Event" => Ok(Self::Event),
            "Mastery" => Ok(Self::Mastery),
            "Personality" => Ok(Self::Personality),
            "Physical Combat" => Ok(Self::PhysicalCombat),
            "Setup" => Ok(Self::Setup),
            "No Type" => Ok(Self::NoType),
            _ => Err(ParseError::InvalidFormat("unknown card type")),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ally => "Ally",
            Self::DragonBall => "Dragon Ball",
            Self::Drill => "Drill",
            Self::EnergyCombat => "Energy Combat",
            Self::Event => "Event",
            Self::Mastery => "Mastery",
            Self::Personality => "Personality",
            Self::PhysicalCombat => "Physical Combat",
            Self::Setup => "Setup",
            Self::NoType => "No Type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Ultra Rare")]
    UltraRare,
    Promo,
    #[serde(rename = "Dragon Rare")]
    DragonRare,
    Starter,
}

impl Default for Rarity {
    fn default() -> Self {
        Self::Promo
    }
}

impl Rarity {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "Common" => Ok(Self::Common),
            "Uncommon" => Ok(Self::Uncommon),
            "Rare" => Ok(Self::Rare),
            "Ultra Rare" => Ok(Self::UltraRare),
            "Promo" => Ok(Self::Promo),
            "Dragon Rare" => Ok(Self::DragonRare),
            "Starter" => Ok(Self::Starter),
            _ => Err(ParseError::InvalidFormat("unknown rarity")),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::UltraRare => "Ultra Rare",
            Self::Promo => "Promo",
            Self::DragonRare => "Dragon Rare",
            Self::Starter => "Starter",
        }
    }
}

/// A catalog card. Immutable from the deck editor's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub style: CardStyle,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub set: String,
    #[serde(default)]
    pub card_level: i64,
    #[serde(default)]
    pub pur: i64,
    #[serde(default)]
    pub power_rating: Vec<i64>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_limit_per_deck")]
    pub limit_per_deck: i64,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub octgn_id: String,
    #[serde(default)]
    pub card_number: String,
}

const fn default_limit_per_deck() -> i64 {
    3
}

impl CardRecord {
    /// `name - title` when the card carries a title, otherwise `name` alone.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.title.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.title)
        }
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if self.name.is_empty() {
            return Err(ParseError::Empty("name"));
        }
        if self.name.len() > NAME_MAX_LEN {
            return Err(ParseError::TooLong("name", NAME_MAX_LEN));
        }
        if self.card_level < 0 {
            return Err(ParseError::InvalidFormat("card_level must be >= 0"));
        }
        if self.limit_per_deck < 0 {
            return Err(ParseError::InvalidFormat("limit_per_deck must be >= 0"));
        }
        Ok(())
    }
}
