//! Completion statistics derived from the catalog and an inventory
//!
//! Pure functions, recomputed whenever either input changes.

use crate::catalog::Catalog;
use crate::inventory::Inventory;
use serde::Serialize;
use vibes_common::VariantCounts;

/// Collection completion summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    /// Catalog cards with at least one copy
    pub unique_cards_owned: usize,
    /// Copies of catalog cards across all variants
    pub total_cards_owned: u64,
    pub playset_complete_count: usize,
    pub master_complete_count: usize,
    pub total_in_set: usize,
}

impl CollectionStats {
    /// Compute stats over catalog cards. Inventory entries for unknown cards are ignored.
    pub fn compute(catalog: &Catalog, inventory: &Inventory) -> Self {
        catalog.iter().fold(
            Self {
                total_in_set: catalog.len(),
                ..Self::default()
            },
            |mut stats, card| {
                let counts = inventory.variants_of(&card.id);
                let total = counts.total();
                if total > 0 {
                    stats.unique_cards_owned += 1;
                }
                stats.total_cards_owned += total as u64;
                if counts.has_playset() {
                    stats.playset_complete_count += 1;
                }
                if counts.has_master_set() {
                    stats.master_complete_count += 1;
                }
                stats
            },
        )
    }

    fn percent(&self, complete: usize) -> f64 {
        if self.total_in_set == 0 {
            return 0.0;
        }
        complete as f64 / self.total_in_set as f64 * 100.0
    }

    pub fn unique_percent(&self) -> f64 {
        self.percent(self.unique_cards_owned)
    }

    pub fn playset_percent(&self) -> f64 {
        self.percent(self.playset_complete_count)
    }

    pub fn master_percent(&self) -> f64 {
        self.percent(self.master_complete_count)
    }
}

/// Ownership badge for a single card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OwnershipStatus {
    Missing,
    Owned,
    PlaysetComplete,
    MasterComplete,
}

impl OwnershipStatus {
    /// Master set takes precedence over playset, playset over plain ownership
    pub fn of(counts: &VariantCounts) -> Self {
        if counts.has_master_set() {
            OwnershipStatus::MasterComplete
        } else if counts.has_playset() {
            OwnershipStatus::PlaysetComplete
        } else if counts.total() > 0 {
            OwnershipStatus::Owned
        } else {
            OwnershipStatus::Missing
        }
    }
}
