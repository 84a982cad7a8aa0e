//! Backing stores for the inventory and the price table
//!
//! [`LocalStorage`] is the on-device key/value store used by anonymous sessions,
//! [`RemoteStore`] the per-user document store with live change notifications.
//! [`SqliteBackend`] implements both on top of one SQLite connection.

use crate::database;
use crate::error::{CollectionError, Result};
use crate::inventory::Inventory;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Local storage key holding the anonymous inventory
pub const LOCAL_STORAGE_KEY: &str = "vibes_collection_local";

/// Remote per-user collection record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    #[serde(default)]
    pub cards: Inventory,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Change notification for one collection record
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteChange {
    /// Id of the store instance that issued the write
    pub origin: String,
    pub record: CollectionRecord,
}

/// On-device key/value storage
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Per-user collection records with live change notifications
pub trait RemoteStore: Send + Sync {
    /// Current record, `None` if the user never saved one
    fn load_collection(&self, user_id: &str) -> Result<Option<CollectionRecord>>;

    /// Merge-write `cards` and `updatedAt` and notify watchers
    fn merge_collection(&self, user_id: &str, cards: &Inventory, origin: &str) -> Result<()>;

    /// Subscribe to changes of one record. Cancel (or drop) the handle on teardown.
    fn watch_collection(&self, user_id: &str) -> Result<Subscription>;
}

/// Source of raw price documents: `(doc_id, json)` pairs
pub trait PriceSource: Send + Sync {
    fn price_documents(&self) -> Result<Vec<(String, String)>>;
}

/// Cancellable handle on a stream of record changes
#[derive(Debug)]
pub struct Subscription {
    user_id: String,
    rx: watch::Receiver<Option<RemoteChange>>,
}

impl Subscription {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Latest unseen change, if any. Never blocks.
    pub fn try_next(&mut self) -> Option<RemoteChange> {
        match self.rx.has_changed() {
            Ok(true) => self.rx.borrow_and_update().clone(),
            _ => None,
        }
    }

    /// Wait for the next change. Returns `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<RemoteChange> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let latest = self.rx.borrow_and_update().clone();
            if latest.is_some() {
                return latest;
            }
        }
    }

    /// Stop receiving notifications
    pub fn cancel(self) {
        log::debug!("Cancelled subscription to collection {}", self.user_id);
    }
}

/// In-process fan-out of record changes, one watch channel per user id
#[derive(Debug, Default)]
pub struct ChangeHub {
    channels: Mutex<HashMap<String, watch::Sender<Option<RemoteChange>>>>,
}

impl ChangeHub {
    pub fn subscribe(&self, user_id: &str) -> Result<Subscription> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| CollectionError::LockPoisoned)?;
        // Drop channels whose watchers are all gone
        channels.retain(|_, sender| sender.receiver_count() > 0);
        let sender = channels
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(None).0);

        Ok(Subscription {
            user_id: user_id.to_string(),
            rx: sender.subscribe(),
        })
    }

    pub fn publish(&self, user_id: &str, change: RemoteChange) {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(_) => {
                log::error!("Change hub lock poisoned, dropping notification for {}", user_id);
                return;
            }
        };

        let Some(sender) = channels.get(user_id) else {
            return;
        };
        if sender.receiver_count() == 0 {
            channels.remove(user_id);
            return;
        }
        sender.send_replace(Some(change));
    }

    /// Number of live subscriptions on a record
    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.channels
            .lock()
            .map(|channels| {
                channels
                    .get(user_id)
                    .map(|sender| sender.receiver_count())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
}

/// SQLite-backed local storage, collection records and price documents
#[derive(Clone)]
pub struct SqliteBackend {
    db: Arc<Mutex<Connection>>,
    hub: Arc<ChangeHub>,
}

impl SqliteBackend {
    /// Wrap an open connection, creating the schema if needed
    pub fn new(conn: Connection) -> Result<Self> {
        database::init_schema(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            hub: Arc::new(ChangeHub::default()),
        })
    }

    /// Open (or create) a database file, creating its parent directory
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened database: {}", path.display());
        Self::new(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Lock the shared connection
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| CollectionError::LockPoisoned)
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }
}

impl LocalStorage for SqliteBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        Ok(database::get_local_item(&conn, key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection()?;
        database::set_local_item(&conn, key, value)?;
        Ok(())
    }
}

impl RemoteStore for SqliteBackend {
    fn load_collection(&self, user_id: &str) -> Result<Option<CollectionRecord>> {
        let row = {
            let conn = self.connection()?;
            database::get_collection_row(&conn, user_id)?
        };

        match row {
            Some((cards, updated_at)) => Ok(Some(CollectionRecord {
                cards: serde_json::from_str(&cards)?,
                updated_at: Some(updated_at),
            })),
            None => Ok(None),
        }
    }

    fn merge_collection(&self, user_id: &str, cards: &Inventory, origin: &str) -> Result<()> {
        let cards_json = serde_json::to_string(cards)?;
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        {
            let conn = self.connection()?;
            database::merge_collection_row(&conn, user_id, &cards_json, &updated_at)?;
        }

        self.hub.publish(
            user_id,
            RemoteChange {
                origin: origin.to_string(),
                record: CollectionRecord {
                    cards: cards.clone(),
                    updated_at: Some(updated_at),
                },
            },
        );
        Ok(())
    }

    fn watch_collection(&self, user_id: &str) -> Result<Subscription> {
        self.hub.subscribe(user_id)
    }
}

impl PriceSource for SqliteBackend {
    fn price_documents(&self) -> Result<Vec<(String, String)>> {
        let conn = self.connection()?;
        Ok(database::get_price_documents(&conn)?)
    }
}
