//! Vibes Collection - trading card collection tracker
//!
//! Tracks owned copies of every card per variant, derives completion
//! statistics against the catalog and values collections and decks from a
//! shared price table.

pub mod backend;
pub mod catalog;
pub mod database;
pub mod deck;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod prices;
pub mod profile;
pub mod session;
pub mod stats;
pub mod store;
pub mod web;

pub use backend::{LocalStorage, PriceSource, RemoteStore, SqliteBackend, Subscription};
pub use catalog::Catalog;
pub use deck::{Deck, DeckEntry, PriceList};
pub use error::{Error, Result};
pub use inventory::{ExportEnvelope, ImportPayload, Inventory};
pub use prices::{format_price, PriceTable};
pub use session::{Identity, Session};
pub use stats::{CollectionStats, OwnershipStatus};
pub use store::{Backing, InventoryStore};
