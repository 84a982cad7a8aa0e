//! Decks and ad-hoc price lists

use serde::{Deserialize, Serialize};
use vibes_common::{variant::clamp_count, Variant};

/// One card line in a deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDeckEntry")]
pub struct DeckEntry {
    pub card_id: String,
    pub quantity: u32,
}

/// Deck line as written by older clients: `id` or `cardId`, `quantity` or
/// `count`, possibly both
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeckEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    card_id: Option<String>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    count: Option<i64>,
}

impl From<RawDeckEntry> for DeckEntry {
    /// The first non-empty id wins; the first positive quantity wins, else one copy
    fn from(raw: RawDeckEntry) -> Self {
        let card_id = raw
            .id
            .filter(|id| !id.is_empty())
            .or(raw.card_id)
            .unwrap_or_default();
        let quantity = raw
            .quantity
            .filter(|q| *q > 0)
            .or(raw.count.filter(|c| *c > 0))
            .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
            .unwrap_or(1);
        Self { card_id, quantity }
    }
}

/// A deck as stored by the builder and share pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default, alias = "mainDeck")]
    pub cards: Vec<DeckEntry>,
}

impl Deck {
    pub fn total_cards(&self) -> u32 {
        self.cards.iter().map(|entry| entry.quantity).sum()
    }
}

/// One line of a price list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListItem {
    pub card_id: String,
    pub variant: Variant,
    pub quantity: u8,
}

/// Shopping list of specific card variants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceList {
    items: Vec<PriceListItem>,
}

impl PriceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one copy, or bump an existing line (capped at 99)
    pub fn add(&mut self, card_id: &str, variant: Variant) {
        match self.position(card_id, variant) {
            Some(i) => {
                let item = &mut self.items[i];
                item.quantity = clamp_count(item.quantity as i64 + 1);
            }
            None => self.items.push(PriceListItem {
                card_id: card_id.to_string(),
                variant,
                quantity: 1,
            }),
        }
    }

    /// Set a line's quantity; zero or less removes the line
    pub fn update_quantity(&mut self, card_id: &str, variant: Variant, quantity: i64) {
        if quantity <= 0 {
            self.remove(card_id, variant);
            return;
        }
        if let Some(i) = self.position(card_id, variant) {
            self.items[i].quantity = clamp_count(quantity);
        }
    }

    pub fn remove(&mut self, card_id: &str, variant: Variant) {
        self.items
            .retain(|item| !(item.card_id == card_id && item.variant == variant));
    }

    pub fn items(&self) -> &[PriceListItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_cards(&self) -> u32 {
        self.items.iter().map(|item| item.quantity as u32).sum()
    }

    fn position(&self, card_id: &str, variant: Variant) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.card_id == card_id && item.variant == variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_accepts_alternate_spellings() {
        let deck: Deck = serde_json::from_str(
            r#"{"name": "Otters", "mainDeck": [
                {"id": "fw-001", "count": 3},
                {"cardId": "fw-002"},
                {"cardId": "fw-003", "quantity": 0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(deck.cards.len(), 3);
        assert_eq!(deck.cards[0].card_id, "fw-001");
        assert_eq!(deck.cards[0].quantity, 3);
        assert_eq!(deck.cards[1].quantity, 1);
        assert_eq!(deck.cards[2].quantity, 1);
        assert_eq!(deck.total_cards(), 5);
        assert!(!deck.is_public);
    }

    #[test]
    fn deck_entry_with_both_spellings() {
        let entry: DeckEntry =
            serde_json::from_str(r#"{"id": "a", "cardId": "a", "quantity": 2, "count": 5}"#)
                .unwrap();
        assert_eq!(entry.card_id, "a");
        assert_eq!(entry.quantity, 2);

        let entry: DeckEntry =
            serde_json::from_str(r#"{"id": "", "cardId": "b", "quantity": 0, "count": 3}"#)
                .unwrap();
        assert_eq!(entry.card_id, "b");
        assert_eq!(entry.quantity, 3);
    }

    #[test]
    fn negative_quantity_counts_as_one() {
        let deck: Deck =
            serde_json::from_str(r#"{"cards": [{"cardId": "a", "quantity": -1}]}"#).unwrap();
        assert_eq!(deck.cards[0].quantity, 1);
        assert_eq!(deck.total_cards(), 1);
    }

    #[test]
    fn deck_entry_serializes_canonical_names() {
        let entry = DeckEntry {
            card_id: "a".to_string(),
            quantity: 2,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"cardId":"a","quantity":2}"#
        );
    }

    #[test]
    fn price_list_add_increments_existing_line() {
        let mut list = PriceList::new();
        list.add("a", Variant::Foil);
        list.add("a", Variant::Foil);
        list.add("a", Variant::Normal);

        assert_eq!(list.items().len(), 2);
        assert_eq!(list.items()[0].quantity, 2);
        assert_eq!(list.total_cards(), 3);
    }

    #[test]
    fn price_list_add_caps_at_99() {
        let mut list = PriceList::new();
        list.add("a", Variant::Normal);
        list.update_quantity("a", Variant::Normal, 99);
        list.add("a", Variant::Normal);
        assert_eq!(list.items()[0].quantity, 99);
    }

    #[test]
    fn price_list_zero_quantity_removes_line() {
        let mut list = PriceList::new();
        list.add("a", Variant::Sketch);
        list.add("b", Variant::Sketch);

        list.update_quantity("a", Variant::Sketch, 0);
        assert_eq!(list.items().len(), 1);

        list.remove("b", Variant::Sketch);
        assert!(list.is_empty());
    }
}
