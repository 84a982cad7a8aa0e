//! Price table lookup and collection valuation
//!
//! The table is read once per session from a [`PriceSource`]: one JSON
//! document per card id plus the `_metadata` sentinel carrying the shared
//! `lastUpdated` timestamp.

use crate::backend::PriceSource;
use crate::deck::{Deck, PriceList};
use crate::inventory::Inventory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vibes_common::Variant;

/// Document id reserved for table metadata
pub const METADATA_DOC_ID: &str = "_metadata";

/// Price quote for one variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    #[serde(default)]
    pub price: Option<f64>,
}

impl PriceEntry {
    /// The quote if it is a usable non-negative number
    pub fn price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p >= 0.0)
    }
}

/// Per-variant quotes for one card. Unknown variant keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPrices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<PriceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foil: Option<PriceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arctic: Option<PriceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketch: Option<PriceEntry>,
}

impl CardPrices {
    pub fn get(&self, variant: Variant) -> Option<&PriceEntry> {
        match variant {
            Variant::Normal => self.normal.as_ref(),
            Variant::Foil => self.foil.as_ref(),
            Variant::Arctic => self.arctic.as_ref(),
            Variant::Sketch => self.sketch.as_ref(),
        }
    }

    pub fn price(&self, variant: Variant) -> Option<f64> {
        self.get(variant).and_then(PriceEntry::price)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceMetadata {
    #[serde(default)]
    last_updated: Option<String>,
}

/// Value per variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VariantBreakdown {
    pub normal: f64,
    pub foil: f64,
    pub arctic: f64,
    pub sketch: f64,
}

impl VariantBreakdown {
    pub fn get(&self, variant: Variant) -> f64 {
        match variant {
            Variant::Normal => self.normal,
            Variant::Foil => self.foil,
            Variant::Arctic => self.arctic,
            Variant::Sketch => self.sketch,
        }
    }

    fn add(&mut self, variant: Variant, value: f64) {
        match variant {
            Variant::Normal => self.normal += value,
            Variant::Foil => self.foil += value,
            Variant::Arctic => self.arctic += value,
            Variant::Sketch => self.sketch += value,
        }
    }
}

/// Market value of an inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionValue {
    pub total: f64,
    pub breakdown: VariantBreakdown,
    /// Copies counted (all variants)
    pub card_count: u64,
    /// Copies with a known price
    pub priced_count: u64,
    pub missing_prices: u64,
}

/// Cost of a deck at one variant
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckCost {
    pub total: f64,
    /// Card ids without a price at that variant
    pub missing: Vec<String>,
}

/// Cost of a price list
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceListTotal {
    pub total: f64,
    /// Copies without a price
    pub missing: u32,
}

/// Price lookup by card id
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    cards: HashMap<String, CardPrices>,
    last_updated: Option<DateTime<Utc>>,
}

impl PriceTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a source, falling back to an empty table on failure
    pub fn load(source: &dyn PriceSource) -> Self {
        match source.price_documents() {
            Ok(documents) => {
                let table = Self::from_documents(documents);
                log::info!(
                    "Loaded prices for {} cards (last updated: {})",
                    table.len(),
                    table
                        .last_updated()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                table
            }
            Err(e) => {
                log::error!("Error loading prices: {}", e);
                Self::empty()
            }
        }
    }

    /// Build from raw `(doc_id, json)` documents. Malformed documents are skipped.
    pub fn from_documents(documents: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut table = Self::empty();

        for (doc_id, json) in documents {
            if doc_id == METADATA_DOC_ID {
                table.last_updated = parse_last_updated(&json);
                continue;
            }
            match serde_json::from_str::<CardPrices>(&json) {
                Ok(prices) => {
                    table.cards.insert(doc_id, prices);
                }
                Err(e) => log::warn!("Skipping price document {}: {}", doc_id, e),
            }
        }
        table
    }

    pub fn get_price(&self, card_id: &str, variant: Variant) -> Option<f64> {
        self.cards
            .get(card_id)
            .and_then(|prices| prices.price(variant))
    }

    pub fn get_card_prices(&self, card_id: &str) -> Option<&CardPrices> {
        self.cards.get(card_id)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Number of priced cards
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Value an inventory. Unpriced copies add nothing but are counted as missing.
    pub fn value_of(&self, inventory: &Inventory) -> CollectionValue {
        let mut value = CollectionValue::default();

        for (card_id, counts) in inventory.iter() {
            for (variant, count) in counts.iter().filter(|(_, count)| *count > 0) {
                value.card_count += count as u64;
                if let Some(price) = self.get_price(card_id, variant) {
                    let subtotal = price * count as f64;
                    value.total += subtotal;
                    value.breakdown.add(variant, subtotal);
                    value.priced_count += count as u64;
                }
            }
        }

        value.missing_prices = value.card_count - value.priced_count;
        value
    }

    /// Cost of a deck with every card bought at `variant`
    pub fn cost_of(&self, deck: &Deck, variant: Variant) -> DeckCost {
        let mut cost = DeckCost::default();
        for entry in &deck.cards {
            match self.get_price(&entry.card_id, variant) {
                Some(price) => cost.total += price * entry.quantity as f64,
                None => cost.missing.push(entry.card_id.clone()),
            }
        }
        cost
    }

    pub fn list_total(&self, list: &PriceList) -> PriceListTotal {
        let mut total = PriceListTotal::default();
        for item in list.items() {
            match self.get_price(&item.card_id, item.variant) {
                Some(price) => total.total += price * item.quantity as f64,
                None => total.missing += item.quantity as u32,
            }
        }
        total
    }
}

fn parse_last_updated(json: &str) -> Option<DateTime<Utc>> {
    let metadata: PriceMetadata = match serde_json::from_str(json) {
        Ok(metadata) => metadata,
        Err(e) => {
            log::warn!("Unreadable price metadata: {}", e);
            return None;
        }
    };
    let raw = metadata.last_updated?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("Invalid lastUpdated timestamp {}: {}", raw, e);
            None
        }
    }
}

/// Display a price as "$1.50", or a dash when unknown
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("${:.2}", price),
        None => "—".to_string(),
    }
}

#[cfg(test)]
#[path = "prices_tests.rs"]
mod tests;
