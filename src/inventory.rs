//! Owned card quantities and the import/export envelope
//!
//! An [`Inventory`] maps card ids to [`VariantCounts`]. Entries whose counts are
//! all zero are never stored: setting the last non-zero variant to zero removes
//! the card.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use vibes_common::{Variant, VariantCounts};

/// Version written into exported envelopes
pub const EXPORT_VERSION: u32 = 2;

/// Per-card owned counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<String, VariantCounts>);

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, VariantCounts>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl FromIterator<(String, VariantCounts)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (String, VariantCounts)>>(iter: I) -> Self {
        Inventory(
            iter.into_iter()
                .filter(|(_, counts)| !counts.is_empty())
                .collect(),
        )
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for a card, the zero record if it is not owned
    pub fn variants_of(&self, card_id: &str) -> VariantCounts {
        self.0.get(card_id).copied().unwrap_or(VariantCounts::ZERO)
    }

    pub fn total_owned(&self, card_id: &str) -> u32 {
        self.variants_of(card_id).total()
    }

    pub fn has_playset(&self, card_id: &str) -> bool {
        self.variants_of(card_id).has_playset()
    }

    pub fn has_master_set(&self, card_id: &str) -> bool {
        self.variants_of(card_id).has_master_set()
    }

    /// Set an absolute count (clamped). Removes the card when all counts reach zero.
    pub fn set_count(&mut self, card_id: &str, variant: Variant, count: i64) -> u8 {
        let mut counts = self.variants_of(card_id);
        let stored = counts.set(variant, count);
        if counts.is_empty() {
            self.0.remove(card_id);
        } else {
            self.0.insert(card_id.to_string(), counts);
        }
        stored
    }

    /// Apply a delta to one variant (clamped). Removes the card when all counts reach zero.
    pub fn adjust(&mut self, card_id: &str, variant: Variant, delta: i64) -> u8 {
        let current = self.variants_of(card_id).get(variant) as i64;
        self.set_count(card_id, variant, current.saturating_add(delta))
    }

    /// Number of distinct cards with at least one copy
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantCounts)> {
        self.0.iter().map(|(id, counts)| (id.as_str(), counts))
    }

    /// Wrap in a versioned export envelope stamped with the current time
    pub fn to_envelope(&self) -> ExportEnvelope {
        ExportEnvelope {
            version: EXPORT_VERSION,
            export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            collection: self.clone(),
        }
    }
}

/// Export file format: `{version, exportDate, collection}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: u32,
    pub export_date: String,
    pub collection: Inventory,
}

/// An import payload after classification
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// `{version, exportDate, collection}`
    Envelope {
        version: Option<u32>,
        export_date: Option<String>,
        collection: Inventory,
    },
    /// `{cards: Inventory}`, the shape of a remote collection record
    BareCards(Inventory),
    /// The inventory object itself
    BareInventory(Inventory),
}

impl ImportPayload {
    /// Parse raw JSON text and classify it
    pub fn parse(text: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::classify(value))
    }

    /// Classify a JSON value: envelope first, then bare cards, then bare inventory.
    ///
    /// Never fails. Shapes that match nothing end up as a (possibly empty)
    /// bare inventory.
    pub fn classify(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            log::warn!("Import payload is not a JSON object, treating it as empty");
            return ImportPayload::BareInventory(Inventory::new());
        };

        if matches!(map.get("collection"), Some(Value::Object(_))) {
            let collection = map.remove("collection").unwrap_or(Value::Null);
            return ImportPayload::Envelope {
                version: map
                    .get("version")
                    .and_then(Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok()),
                export_date: map
                    .get("exportDate")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                collection: lenient_inventory(collection),
            };
        }

        if matches!(map.get("cards"), Some(Value::Object(_))) {
            let cards = map.remove("cards").unwrap_or(Value::Null);
            return ImportPayload::BareCards(lenient_inventory(cards));
        }

        ImportPayload::BareInventory(lenient_inventory(Value::Object(map)))
    }

    /// The inventory carried by the payload, whatever its shape
    pub fn into_inventory(self) -> Inventory {
        match self {
            ImportPayload::Envelope { collection, .. } => collection,
            ImportPayload::BareCards(cards) => cards,
            ImportPayload::BareInventory(inventory) => inventory,
        }
    }
}

/// Build an inventory from a JSON object, skipping entries that are not count records
fn lenient_inventory(value: Value) -> Inventory {
    let Value::Object(map) = value else {
        return Inventory::new();
    };

    map.into_iter()
        .filter_map(
            |(card_id, counts)| match serde_json::from_value::<VariantCounts>(counts) {
                Ok(counts) => Some((card_id, counts)),
                Err(e) => {
                    log::warn!("Skipping import entry {}: {}", card_id, e);
                    None
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variants_of_unseen_card_is_zero() {
        let inventory = Inventory::new();
        assert_eq!(inventory.variants_of("nope"), VariantCounts::ZERO);
        assert_eq!(inventory.total_owned("nope"), 0);
    }

    #[test]
    fn adjust_clamps_and_leaves_other_variants() {
        let mut inventory = Inventory::new();
        inventory.set_count("vb-001", Variant::Foil, 3);
        assert_eq!(inventory.adjust("vb-001", Variant::Normal, 120), 99);
        assert_eq!(inventory.adjust("vb-001", Variant::Normal, -200), 0);

        let counts = inventory.variants_of("vb-001");
        assert_eq!(counts.normal, 0);
        assert_eq!(counts.foil, 3);
    }

    #[test]
    fn last_zero_variant_removes_entry() {
        let mut inventory = Inventory::new();
        inventory.adjust("vb-002", Variant::Sketch, 1);
        assert_eq!(inventory.len(), 1);

        inventory.adjust("vb-002", Variant::Sketch, -1);
        assert!(inventory.is_empty());
        assert!(inventory.iter().all(|(_, c)| !c.is_empty()));
    }

    #[test]
    fn deserialize_drops_all_zero_entries() {
        let inventory: Inventory = serde_json::from_str(
            r#"{"a": {"normal": 0, "foil": 0, "arctic": 0, "sketch": 0}, "b": {"foil": 2}}"#,
        )
        .unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.variants_of("b").foil, 2);
    }

    #[test]
    fn classify_prefers_envelope() {
        let payload = ImportPayload::classify(json!({
            "version": 2,
            "exportDate": "2026-01-01T00:00:00.000Z",
            "collection": {"a": {"normal": 1}},
            "cards": {"b": {"normal": 1}}
        }));
        match payload {
            ImportPayload::Envelope {
                version,
                collection,
                ..
            } => {
                assert_eq!(version, Some(2));
                assert_eq!(collection.total_owned("a"), 1);
                assert_eq!(collection.total_owned("b"), 0);
            }
            other => panic!("expected envelope, got {:?}", other),
        }
    }

    #[test]
    fn classify_bare_cards_then_bare_inventory() {
        let cards = ImportPayload::classify(json!({"cards": {"a": {"foil": 2}}}));
        assert!(matches!(cards, ImportPayload::BareCards(_)));
        assert_eq!(cards.into_inventory().variants_of("a").foil, 2);

        let bare = ImportPayload::classify(json!({"a": {"arctic": 1}}));
        assert!(matches!(bare, ImportPayload::BareInventory(_)));
        assert_eq!(bare.into_inventory().variants_of("a").arctic, 1);
    }

    #[test]
    fn classify_never_fails_on_odd_shapes() {
        let payload = ImportPayload::classify(json!([1, 2, 3]));
        assert_eq!(payload.into_inventory(), Inventory::new());

        let payload = ImportPayload::classify(json!({"a": "lots", "b": {"normal": 1}}));
        let inventory = payload.into_inventory();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.total_owned("b"), 1);
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(ImportPayload::parse("{not json").is_err());
    }

    #[test]
    fn envelope_round_trips() {
        let mut inventory = Inventory::new();
        inventory.set_count("a", Variant::Normal, 4);
        inventory.set_count("b", Variant::Sketch, 1);

        let text = serde_json::to_string(&inventory.to_envelope()).unwrap();
        let restored = ImportPayload::parse(&text).unwrap().into_inventory();
        assert_eq!(restored, inventory);
    }
}
