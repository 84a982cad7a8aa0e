//! Error types shared across the Vibes crates

use thiserror::Error;

/// Errors raised while interpreting shared card and variant values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommonError {
    /// Variant name is not one of normal, foil, arctic, sketch
    #[error("Unknown variant: {0}")]
    UnknownVariant(String),
    /// Rarity name is not part of the rarity ladder
    #[error("Unknown rarity: {0}")]
    UnknownRarity(String),
    /// Color name is not a Vibes card color
    #[error("Unknown color: {0}")]
    UnknownColor(String),
}

/// Result alias for shared operations
pub type Result<T> = std::result::Result<T, CommonError>;
