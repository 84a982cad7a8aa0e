//! Static card catalog
//!
//! The catalog is bundled into the binary and loaded once. It keeps the card
//! order of the source table and never changes afterwards.

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use vibes_common::Card;

/// Catalog table compiled into the binary
const BUNDLED_CARDS: &str = include_str!("../data/cards.json");

/// Ordered card list with lookup by card id
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: Vec<Card>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Parse the bundled catalog table
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CARDS)
    }

    /// Read a catalog table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        log::info!("Loaded {} cards from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Load a catalog, falling back to an empty one on failure
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let result = match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        };
        result.unwrap_or_else(|e| {
            log::error!("Failed to load card catalog: {}", e);
            Self::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let cards: Vec<Card> = serde_json::from_str(json)?;
        Ok(Self::from_cards(cards))
    }

    /// Build from a card list. Later duplicates of an id are dropped.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        let mut kept = Vec::with_capacity(cards.len());
        let mut index = HashMap::with_capacity(cards.len());

        for card in cards {
            if index.contains_key(&card.id) {
                log::warn!("Duplicate card id in catalog: {}", card.id);
                continue;
            }
            index.insert(card.id.clone(), kept.len());
            kept.push(card);
        }

        Self { cards: kept, index }
    }

    /// Look up a card by its id
    pub fn get(&self, card_id: &str) -> Option<&Card> {
        self.index.get(card_id).map(|&i| &self.cards[i])
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.index.contains_key(card_id)
    }

    /// Get the total number of cards
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all cards in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Cards whose name contains `query` (case-insensitive), catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Card> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.cards
            .iter()
            .filter(|card| card.name.to_lowercase().contains(&query))
            .take(limit)
            .collect()
    }

    /// Distinct set names in order of first appearance
    pub fn sets(&self) -> Vec<&str> {
        let mut sets: Vec<&str> = Vec::new();
        for card in &self.cards {
            if !sets.contains(&card.set.as_str()) {
                sets.push(&card.set);
            }
        }
        sets
    }
}

#[cfg(test)]
pub use tests::make_test_card;

#[cfg(test)]
mod tests {
    use super::*;
    use vibes_common::{Color, Rarity};

    /// Create a test card with default values
    pub fn make_test_card(id: &str, name: &str) -> Card {
        Card {
            id: id.to_string(),
            name: name.to_string(),
            types: vec!["Creature".to_string()],
            color: Color::Blue,
            rarity: Rarity::Common,
            cost: 1,
            vibe: Some(1),
            set: "Test Set".to_string(),
            number: 1,
            text: String::new(),
            image_url: None,
        }
    }

    #[test]
    fn bundled_catalog_parses() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.get("fw-001").unwrap().name, "Chill Otter");
        assert_eq!(catalog.sets(), vec!["First Wave", "Second Wave"]);
    }

    #[test]
    fn catalog_keeps_order_and_first_duplicate() {
        let catalog = Catalog::from_cards(vec![
            make_test_card("b", "Bravo"),
            make_test_card("a", "Alpha"),
            make_test_card("b", "Bravo Again"),
        ]);

        assert_eq!(catalog.len(), 2);
        let ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(catalog.get("b").unwrap().name, "Bravo");
        assert!(catalog.get("zzz").is_none());
    }

    #[test]
    fn search_is_case_insensitive_and_limited() {
        let catalog = Catalog::from_cards(vec![
            make_test_card("1", "Neon Fox"),
            make_test_card("2", "Fox Hollow"),
            make_test_card("3", "Otter"),
        ]);

        let found: Vec<&str> = catalog.search("FOX", 20).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(found, vec!["1", "2"]);
        assert_eq!(catalog.search("fox", 1).len(), 1);
        assert!(catalog.search("  ", 20).is_empty());
    }

    #[test]
    fn load_or_empty_degrades_on_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let catalog = Catalog::load_or_empty(Some(&temp_dir.path().join("missing.json")));
        assert!(catalog.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("cards.json");
        std::fs::write(&path, BUNDLED_CARDS).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), Catalog::bundled().unwrap().len());
    }
}
