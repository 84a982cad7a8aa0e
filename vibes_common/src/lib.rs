//! Shared types for the Vibes TCG collection tracker
//!
//! Card definitions, printable variants and per-variant owned counts used by
//! the catalog, the inventory store and the price table.

pub mod card;
pub mod error;
pub mod variant;

pub use card::{Card, Color, Rarity};
pub use error::{CommonError, Result};
pub use variant::{Variant, VariantCounts, MAX_COUNT};
