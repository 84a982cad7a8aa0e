//! Card definitions from the static catalog table

use crate::error::CommonError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Card rarity, ordered from most to least common
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Mythic => "Mythic",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "mythic" => Ok(Rarity::Mythic),
            _ => Err(CommonError::UnknownRarity(s.to_string())),
        }
    }
}

/// Card color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Colorless,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Colorless,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::Purple => "Purple",
            Color::Colorless => "Colorless",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| CommonError::UnknownColor(s.to_string()))
    }
}

/// One catalog entry. Never mutated after the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    /// Type tags ("Creature", "Spell", ...)
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    pub color: Color,
    pub rarity: Rarity,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub vibe: Option<i32>,
    pub set: String,
    pub number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Card {
    /// True if any type tag matches (case-insensitive)
    pub fn has_type(&self, card_type: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(card_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_orders_common_to_mythic() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Rare < Rarity::Mythic);
    }

    #[test]
    fn color_parses_any_case() {
        assert_eq!("purple".parse::<Color>().unwrap(), Color::Purple);
        assert!("Orange".parse::<Color>().is_err());
    }

    #[test]
    fn card_deserializes_from_catalog_json() {
        let json = r#"{
            "id": "vb-001",
            "name": "Chill Otter",
            "type": ["Creature", "Beast"],
            "color": "Blue",
            "rarity": "Uncommon",
            "cost": 2,
            "vibe": null,
            "set": "First Wave",
            "number": 1,
            "text": "When played, draw a card.",
            "imageUrl": "/cards/vb-001.png"
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id, "vb-001");
        assert_eq!(card.rarity, Rarity::Uncommon);
        assert_eq!(card.vibe, None);
        assert!(card.has_type("beast"));
        assert_eq!(card.image_url.as_deref(), Some("/cards/vb-001.png"));
    }
}
