//! Catalog filtering and sorting for collection pages

use crate::catalog::Catalog;
use crate::error::Result;
use crate::inventory::Inventory;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vibes_common::{Card, Color, Rarity};

/// Ownership filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnedFilter {
    #[default]
    All,
    Owned,
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Name,
    Owned,
    Rarity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort order written as `field-direction`, e.g. "name-asc" or "owned-desc"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (field, direction) = s.split_once('-').unwrap_or((s, "asc"));
        let field = match field {
            "name" => SortField::Name,
            "owned" => SortField::Owned,
            "rarity" => SortField::Rarity,
            other => return Err(format!("unknown sort field: {}", other)),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(format!("unknown sort direction: {}", other)),
        };
        Ok(Self { field, direction })
    }
}

/// Filters applied to the catalog. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFilter {
    pub search: Option<String>,
    pub color: Option<Color>,
    pub card_type: Option<String>,
    pub rarity: Option<Rarity>,
    pub set: Option<String>,
    pub owned: OwnedFilter,
    pub sort: SortOrder,
}

/// Filter values as they arrive from a query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub search: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub rarity: Option<String>,
    pub set: Option<String>,
    pub owned: Option<OwnedFilter>,
    pub sort: Option<String>,
}

/// "All" and empty strings disable a filter
fn selected(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

impl TryFrom<FilterParams> for CardFilter {
    type Error = crate::Error;

    fn try_from(params: FilterParams) -> Result<Self> {
        let sort = match selected(params.sort) {
            Some(sort) => sort.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring sort order: {}", e);
                SortOrder::default()
            }),
            None => SortOrder::default(),
        };

        Ok(Self {
            search: selected(params.search),
            color: selected(params.color)
                .map(|c| c.parse::<Color>())
                .transpose()?,
            card_type: selected(params.card_type),
            rarity: selected(params.rarity)
                .map(|r| r.parse::<Rarity>())
                .transpose()?,
            set: selected(params.set),
            owned: params.owned.unwrap_or_default(),
            sort,
        })
    }
}

impl CardFilter {
    /// True if the card passes every active filter
    pub fn matches(&self, card: &Card, inventory: &Inventory) -> bool {
        if let Some(search) = &self.search {
            if !card.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if self.color.is_some_and(|color| card.color != color) {
            return false;
        }
        if let Some(card_type) = &self.card_type {
            if !card.has_type(card_type) {
                return false;
            }
        }
        if self.rarity.is_some_and(|rarity| card.rarity != rarity) {
            return false;
        }
        if let Some(set) = &self.set {
            if &card.set != set {
                return false;
            }
        }

        let total = inventory.total_owned(&card.id);
        match self.owned {
            OwnedFilter::All => true,
            OwnedFilter::Owned => total > 0,
            OwnedFilter::Missing => total == 0,
        }
    }

    /// Filtered and sorted cards. Ties keep catalog order.
    pub fn apply<'a>(&self, catalog: &'a Catalog, inventory: &Inventory) -> Vec<&'a Card> {
        let mut cards: Vec<&Card> = catalog
            .iter()
            .filter(|card| self.matches(card, inventory))
            .collect();

        cards.sort_by(|a, b| {
            let ordering = match self.sort.field {
                SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortField::Owned => inventory
                    .total_owned(&a.id)
                    .cmp(&inventory.total_owned(&b.id)),
                SortField::Rarity => a.rarity.cmp(&b.rarity),
            };
            match self.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::make_test_card;
    use vibes_common::Variant;

    fn catalog() -> Catalog {
        let mut otter = make_test_card("1", "Chill Otter");
        otter.rarity = Rarity::Rare;
        let mut fox = make_test_card("2", "Neon Fox");
        fox.color = Color::Red;
        fox.types = vec!["Creature".into(), "Beast".into()];
        let mut spell = make_test_card("3", "Golden Hour");
        spell.color = Color::Yellow;
        spell.types = vec!["Spell".into()];
        spell.rarity = Rarity::Mythic;
        spell.set = "Second Wave".into();
        Catalog::from_cards(vec![otter, fox, spell])
    }

    fn ids(cards: &[&Card]) -> Vec<String> {
        cards.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn default_filter_sorts_by_name() {
        let catalog = catalog();
        let cards = CardFilter::default().apply(&catalog, &Inventory::new());
        assert_eq!(ids(&cards), vec!["1", "3", "2"]);
    }

    #[test]
    fn filters_by_color_type_set_and_search() {
        let catalog = catalog();
        let inventory = Inventory::new();

        let red = CardFilter {
            color: Some(Color::Red),
            ..Default::default()
        };
        assert_eq!(ids(&red.apply(&catalog, &inventory)), vec!["2"]);

        let beasts = CardFilter {
            card_type: Some("beast".into()),
            ..Default::default()
        };
        assert_eq!(ids(&beasts.apply(&catalog, &inventory)), vec!["2"]);

        let second_wave = CardFilter {
            set: Some("Second Wave".into()),
            ..Default::default()
        };
        assert_eq!(ids(&second_wave.apply(&catalog, &inventory)), vec!["3"]);

        let search = CardFilter {
            search: Some("OTT".into()),
            ..Default::default()
        };
        assert_eq!(ids(&search.apply(&catalog, &inventory)), vec!["1"]);
    }

    #[test]
    fn owned_and_missing_filters() {
        let catalog = catalog();
        let mut inventory = Inventory::new();
        inventory.set_count("2", Variant::Foil, 1);

        let owned = CardFilter {
            owned: OwnedFilter::Owned,
            ..Default::default()
        };
        assert_eq!(ids(&owned.apply(&catalog, &inventory)), vec!["2"]);

        let missing = CardFilter {
            owned: OwnedFilter::Missing,
            ..Default::default()
        };
        assert_eq!(ids(&missing.apply(&catalog, &inventory)), vec!["1", "3"]);
    }

    #[test]
    fn sorts_by_owned_and_rarity() {
        let catalog = catalog();
        let mut inventory = Inventory::new();
        inventory.set_count("3", Variant::Normal, 5);
        inventory.set_count("1", Variant::Normal, 2);

        let by_owned = CardFilter {
            sort: "owned-desc".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&by_owned.apply(&catalog, &inventory)), vec!["3", "1", "2"]);

        let by_rarity = CardFilter {
            sort: "rarity-asc".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(ids(&by_rarity.apply(&catalog, &inventory)), vec!["2", "1", "3"]);
    }

    #[test]
    fn sort_order_parsing() {
        assert_eq!(
            "name-desc".parse::<SortOrder>().unwrap(),
            SortOrder {
                field: SortField::Name,
                direction: SortDirection::Desc
            }
        );
        assert_eq!("owned".parse::<SortOrder>().unwrap().direction, SortDirection::Asc);
        assert!("price-asc".parse::<SortOrder>().is_err());
    }

    #[test]
    fn params_treat_all_as_unset() {
        let params = FilterParams {
            color: Some("All".into()),
            rarity: Some("mythic".into()),
            sort: Some("bogus-order".into()),
            ..Default::default()
        };
        let filter = CardFilter::try_from(params).unwrap();
        assert_eq!(filter.color, None);
        assert_eq!(filter.rarity, Some(Rarity::Mythic));
        assert_eq!(filter.sort, SortOrder::default());
    }

    #[test]
    fn params_reject_unknown_color() {
        let params = FilterParams {
            color: Some("Orange".into()),
            ..Default::default()
        };
        assert!(CardFilter::try_from(params).is_err());
    }
}
