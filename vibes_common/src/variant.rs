//! Printable card variants and per-variant owned counts

use crate::error::CommonError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for any single variant count
pub const MAX_COUNT: u8 = 99;

/// Number of copies that make up a playset
pub const PLAYSET_SIZE: u32 = 4;

/// The four printable variants of every card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Normal,
    Foil,
    Arctic,
    Sketch,
}

impl Variant {
    /// All variants in display order
    pub const ALL: [Variant; 4] = [
        Variant::Normal,
        Variant::Foil,
        Variant::Arctic,
        Variant::Sketch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Normal => "normal",
            Variant::Foil => "foil",
            Variant::Arctic => "arctic",
            Variant::Sketch => "sketch",
        }
    }

    /// Human readable label ("Foil")
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Normal => "Normal",
            Variant::Foil => "Foil",
            Variant::Arctic => "Arctic",
            Variant::Sketch => "Sketch",
        }
    }

    /// Single letter used in compact count summaries ("2N 1F")
    pub fn short(&self) -> char {
        match self {
            Variant::Normal => 'N',
            Variant::Foil => 'F',
            Variant::Arctic => 'A',
            Variant::Sketch => 'S',
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Variant::Normal),
            "foil" => Ok(Variant::Foil),
            "arctic" => Ok(Variant::Arctic),
            "sketch" => Ok(Variant::Sketch),
            _ => Err(CommonError::UnknownVariant(s.to_string())),
        }
    }
}

/// Clamp an arbitrary signed count into `[0, MAX_COUNT]`
pub fn clamp_count(count: i64) -> u8 {
    count.clamp(0, MAX_COUNT as i64) as u8
}

/// Owned quantity of one card across the four variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawCounts")]
pub struct VariantCounts {
    pub normal: u8,
    pub foil: u8,
    pub arctic: u8,
    pub sketch: u8,
}

/// Wire shape accepted for counts: missing fields are 0, any number is clamped
#[derive(Deserialize)]
struct RawCounts {
    #[serde(default)]
    normal: f64,
    #[serde(default)]
    foil: f64,
    #[serde(default)]
    arctic: f64,
    #[serde(default)]
    sketch: f64,
}

fn clamp_raw(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    clamp_count(value.trunc() as i64)
}

impl From<RawCounts> for VariantCounts {
    fn from(raw: RawCounts) -> Self {
        Self {
            normal: clamp_raw(raw.normal),
            foil: clamp_raw(raw.foil),
            arctic: clamp_raw(raw.arctic),
            sketch: clamp_raw(raw.sketch),
        }
    }
}

impl VariantCounts {
    pub const ZERO: VariantCounts = VariantCounts {
        normal: 0,
        foil: 0,
        arctic: 0,
        sketch: 0,
    };

    /// Build counts from four values, clamping each one
    pub fn new(normal: i64, foil: i64, arctic: i64, sketch: i64) -> Self {
        Self {
            normal: clamp_count(normal),
            foil: clamp_count(foil),
            arctic: clamp_count(arctic),
            sketch: clamp_count(sketch),
        }
    }

    pub fn get(&self, variant: Variant) -> u8 {
        match variant {
            Variant::Normal => self.normal,
            Variant::Foil => self.foil,
            Variant::Arctic => self.arctic,
            Variant::Sketch => self.sketch,
        }
    }

    /// Set one variant, clamped to `[0, MAX_COUNT]`. Returns the stored value.
    pub fn set(&mut self, variant: Variant, count: i64) -> u8 {
        let count = clamp_count(count);
        match variant {
            Variant::Normal => self.normal = count,
            Variant::Foil => self.foil = count,
            Variant::Arctic => self.arctic = count,
            Variant::Sketch => self.sketch = count,
        }
        count
    }

    pub fn total(&self) -> u32 {
        self.iter().map(|(_, count)| count as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Four copies in any combination of variants
    pub fn has_playset(&self) -> bool {
        self.total() >= PLAYSET_SIZE
    }

    /// At least one copy of every variant
    pub fn has_master_set(&self) -> bool {
        Variant::ALL.iter().all(|v| self.get(*v) >= 1)
    }

    /// Iterate `(variant, count)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (Variant, u8)> + '_ {
        Variant::ALL.iter().map(move |v| (*v, self.get(*v)))
    }

    /// Compact summary of non-zero variants, e.g. "2N 1F"
    pub fn summary(&self) -> String {
        self.iter()
            .filter(|(_, count)| *count > 0)
            .map(|(v, count)| format!("{}{}", count, v.short()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
