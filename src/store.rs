//! Inventory store: the single owner of the in-memory inventory
//!
//! Every mutation goes through [`InventoryStore::adjust`],
//! [`InventoryStore::set_count`] or [`InventoryStore::replace_all`]. Each one
//! updates the cache and issues the persistence write in the same call, so no
//! reader ever sees a cache change without the matching write.
//!
//! Backing selection:
//! - anonymous session: the local storage item [`LOCAL_STORAGE_KEY`]
//! - identified session: the remote record of the signed-in user, watched
//!   for changes made elsewhere
//! - viewing another user's collection: that user's remote record, read-only

use crate::backend::{LocalStorage, RemoteStore, Subscription, LOCAL_STORAGE_KEY};
use crate::inventory::{ExportEnvelope, ImportPayload, Inventory};
use crate::session::Session;
use std::sync::Arc;
use vibes_common::{Variant, VariantCounts};

/// Where the current inventory is read from and written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    Local,
    Remote(String),
    /// Someone else's record, never written
    ReadOnly(String),
}

pub struct InventoryStore {
    session: Session,
    /// Collection being viewed; `None` means the session's own collection
    viewed_user: Option<String>,
    inventory: Inventory,
    local: Arc<dyn LocalStorage>,
    remote: Arc<dyn RemoteStore>,
    subscription: Option<Subscription>,
    /// Tags our writes so their echoes can be recognised
    origin: String,
}

impl InventoryStore {
    /// Open the session's own collection
    pub fn open(
        session: Session,
        local: Arc<dyn LocalStorage>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self::build(session, None, local, remote)
    }

    /// Open another user's collection (profile page). Writable only if it is
    /// the signed-in user's own.
    pub fn open_user(
        session: Session,
        user_id: &str,
        local: Arc<dyn LocalStorage>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self::build(session, Some(user_id.to_string()), local, remote)
    }

    fn build(
        session: Session,
        viewed_user: Option<String>,
        local: Arc<dyn LocalStorage>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        let mut store = Self {
            session,
            viewed_user,
            inventory: Inventory::new(),
            local,
            remote,
            subscription: None,
            origin: uuid::Uuid::new_v4().to_string(),
        };
        store.mount();
        store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backing(&self) -> Backing {
        match (&self.viewed_user, self.session.user_id()) {
            (Some(viewed), Some(own)) if viewed == own => Backing::Remote(viewed.clone()),
            (Some(viewed), _) => Backing::ReadOnly(viewed.clone()),
            (None, Some(own)) => Backing::Remote(own.to_string()),
            (None, None) => Backing::Local,
        }
    }

    /// True when mutations are persisted (not viewing someone else's collection)
    pub fn is_own_collection(&self) -> bool {
        !matches!(self.backing(), Backing::ReadOnly(_))
    }

    /// Load from the current backing and start watching remote records
    fn mount(&mut self) {
        self.inventory = match self.backing() {
            Backing::Local => self.load_local(),
            Backing::Remote(user_id) | Backing::ReadOnly(user_id) => {
                match self.remote.watch_collection(&user_id) {
                    Ok(subscription) => self.subscription = Some(subscription),
                    Err(e) => log::error!("Failed to watch collection {}: {}", user_id, e),
                }
                self.load_remote(&user_id)
            }
        };
        log::debug!(
            "Mounted inventory ({:?}): {} cards",
            self.backing(),
            self.inventory.len()
        );
    }

    fn load_local(&self) -> Inventory {
        let saved = match self.local.get_item(LOCAL_STORAGE_KEY) {
            Ok(saved) => saved,
            Err(e) => {
                log::error!("Failed to load local collection: {}", e);
                return Inventory::new();
            }
        };

        match saved.map(|json| serde_json::from_str::<Inventory>(&json)) {
            Some(Ok(inventory)) => inventory,
            Some(Err(e)) => {
                log::error!("Failed to parse local collection: {}", e);
                Inventory::new()
            }
            None => Inventory::new(),
        }
    }

    fn load_remote(&self, user_id: &str) -> Inventory {
        match self.remote.load_collection(user_id) {
            Ok(Some(record)) => record.cards,
            Ok(None) => Inventory::new(),
            Err(e) => {
                log::error!("Error loading collection {}: {}", user_id, e);
                Inventory::new()
            }
        }
    }

    /// Cancel the live subscription, if any
    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    /// Switch identity (sign-in / sign-out). The inventory is reloaded from the
    /// new backing; nothing is carried over between the two.
    pub fn set_session(&mut self, session: Session) {
        if session == self.session {
            return;
        }
        self.teardown();
        self.session = session;
        self.inventory = Inventory::new();
        self.mount();
    }

    /// Write the current inventory to the backing store. Failures are logged
    /// and the in-memory state is kept.
    fn persist(&self) {
        match self.backing() {
            Backing::Local => {
                let result = serde_json::to_string(&self.inventory)
                    .map_err(crate::Error::from)
                    .and_then(|json| self.local.set_item(LOCAL_STORAGE_KEY, &json));
                if let Err(e) = result {
                    log::error!("Failed to save local collection: {}", e);
                }
            }
            Backing::Remote(user_id) => {
                if let Err(e) = self
                    .remote
                    .merge_collection(&user_id, &self.inventory, &self.origin)
                {
                    log::error!("Failed to save collection {}: {}", user_id, e);
                }
            }
            Backing::ReadOnly(_) => {}
        }
    }

    /// Apply a mutation to the cache and persist it if anything changed
    fn mutate<T>(&mut self, action: &str, f: impl FnOnce(&mut Inventory) -> T) -> Option<T> {
        if let Backing::ReadOnly(user_id) = self.backing() {
            log::warn!("Ignoring {} on read-only collection of {}", action, user_id);
            return None;
        }

        let mut next = self.inventory.clone();
        let result = f(&mut next);
        if next != self.inventory {
            self.inventory = next;
            self.persist();
        }
        Some(result)
    }

    // ── Reads ──────────────────────────────────────────────────────────────

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn variants_of(&self, card_id: &str) -> VariantCounts {
        self.inventory.variants_of(card_id)
    }

    pub fn total_owned(&self, card_id: &str) -> u32 {
        self.inventory.total_owned(card_id)
    }

    pub fn has_playset(&self, card_id: &str) -> bool {
        self.inventory.has_playset(card_id)
    }

    pub fn has_master_set(&self, card_id: &str) -> bool {
        self.inventory.has_master_set(card_id)
    }

    // ── Mutations ──────────────────────────────────────────────────────────

    /// Add `delta` to one variant (clamped to 0..=99). Returns the stored count.
    pub fn adjust(&mut self, card_id: &str, variant: Variant, delta: i64) -> u8 {
        self.mutate("adjust", |inventory| inventory.adjust(card_id, variant, delta))
            .unwrap_or_else(|| self.variants_of(card_id).get(variant))
    }

    /// Set one variant to an absolute count (clamped to 0..=99). Returns the stored count.
    pub fn set_count(&mut self, card_id: &str, variant: Variant, count: i64) -> u8 {
        self.mutate("set_count", |inventory| {
            inventory.set_count(card_id, variant, count)
        })
        .unwrap_or_else(|| self.variants_of(card_id).get(variant))
    }

    /// Replace the whole inventory
    pub fn replace_all(&mut self, inventory: Inventory) {
        self.mutate("replace_all", |current| *current = inventory);
    }

    /// Classify an import payload and replace the inventory with its contents
    pub fn import(&mut self, payload: ImportPayload) {
        self.replace_all(payload.into_inventory());
    }

    /// Empty the collection
    pub fn reset(&mut self) {
        self.replace_all(Inventory::new());
    }

    pub fn export_snapshot(&self) -> ExportEnvelope {
        self.inventory.to_envelope()
    }

    // ── Live updates ───────────────────────────────────────────────────────

    fn apply_change(&mut self, change: crate::backend::RemoteChange) -> bool {
        if change.origin == self.origin {
            // Echo of our own write, the cache already holds it
            return false;
        }
        if change.record.cards == self.inventory {
            return false;
        }
        self.inventory = change.record.cards;
        true
    }

    /// Apply a pending remote change, if one arrived. Returns true if the
    /// inventory changed.
    pub fn sync_remote(&mut self) -> bool {
        let change = match self.subscription.as_mut() {
            Some(subscription) => subscription.try_next(),
            None => return false,
        };
        match change {
            Some(change) => self.apply_change(change),
            None => false,
        }
    }

    /// Wait until a change from another writer updates the inventory.
    /// Returns false when there is nothing to wait on.
    pub async fn wait_for_remote(&mut self) -> bool {
        loop {
            let change = match self.subscription.as_mut() {
                Some(subscription) => subscription.next().await,
                None => return false,
            };
            match change {
                Some(change) => {
                    if self.apply_change(change) {
                        return true;
                    }
                }
                None => return false,
            }
        }
    }

    /// Tear down the store, cancelling its subscription
    pub fn close(mut self) {
        self.teardown();
    }
}

impl Drop for InventoryStore {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
