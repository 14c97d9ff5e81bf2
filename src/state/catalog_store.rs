use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{AppError, Result};
use crate::listing::{unlist, Listing, OwnedAsset, RemoveScope};
use crate::types::AssetRecord;

/// Catalog record plus its position in the source order.
#[derive(Debug, Clone)]
struct Slot {
    seq: usize,
    record: AssetRecord,
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

/// In-memory catalog and the session wallet's holdings.
///
/// Lock order for listing mutations is `owned` then `assets`; readers only
/// ever hold one shard guard at a time.
pub struct CatalogStore {
    /// asset_id → record, tagged with source order
    assets: DashMap<String, Slot>,
    next_seq: AtomicUsize,
    /// asset_id → holdings of the session wallet
    owned: DashMap<String, OwnedAsset>,
}

impl CatalogStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            assets: DashMap::new(),
            next_seq: AtomicUsize::new(0),
            owned: DashMap::new(),
        })
    }

    /// Add records in source order. A known id is replaced in place and
    /// keeps its original position.
    pub fn load(&self, records: Vec<AssetRecord>) {
        for record in records {
            match self.assets.entry(record.id.clone()) {
                Entry::Occupied(mut e) => e.get_mut().record = record,
                Entry::Vacant(e) => {
                    let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                    e.insert(Slot { seq, record });
                }
            }
        }
    }

    /// Holdings for assets that are not in the catalog are dropped.
    pub fn load_collection(&self, holdings: Vec<OwnedAsset>) -> usize {
        let mut loaded = 0;
        for holding in holdings {
            if self.assets.contains_key(&holding.asset_id) {
                self.owned.insert(holding.asset_id.clone(), holding);
                loaded += 1;
            } else {
                tracing::warn!(asset_id = %holding.asset_id, "Holding references unknown asset, skipped");
            }
        }
        loaded
    }

    /// Owned copy of every record, in source order.
    pub fn snapshot(&self) -> Vec<AssetRecord> {
        let mut slots: Vec<Slot> = self.assets.iter().map(|r| r.value().clone()).collect();
        slots.sort_by_key(|s| s.seq);
        slots.into_iter().map(|s| s.record).collect()
    }

    pub fn get(&self, id: &str) -> Option<AssetRecord> {
        self.assets.get(id).map(|s| s.record.clone())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_owned(&self, id: &str) -> bool {
        self.owned.contains_key(id)
    }

    /// Holdings in catalog order.
    pub fn collection(&self) -> Vec<OwnedAsset> {
        let mut held: Vec<(usize, OwnedAsset)> = self
            .owned
            .iter()
            .map(|r| {
                let seq = self.assets.get(r.key()).map_or(usize::MAX, |s| s.seq);
                (seq, r.value().clone())
            })
            .collect();
        held.sort_by_key(|(seq, _)| *seq);
        held.into_iter().map(|(_, h)| h).collect()
    }

    pub fn owned_asset(&self, id: &str) -> Option<OwnedAsset> {
        self.owned.get(id).map(|r| r.value().clone())
    }

    // -----------------------------------------------------------------------
    // Listing mutations
    // -----------------------------------------------------------------------

    pub fn create_listing(&self, id: &str, listing: Listing) -> Result<AssetRecord> {
        let mut holding = self
            .owned
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if holding.listing.is_some() {
            return Err(AppError::Conflict(format!("{id} is already listed")));
        }
        let record = self.with_record(id, |rec| listing.apply_to(rec))?;
        holding.listing = Some(listing);
        Ok(record)
    }

    pub fn edit_listing(&self, id: &str, listing: Listing) -> Result<AssetRecord> {
        let mut holding = self
            .owned
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let previous = holding
            .listing
            .as_ref()
            .ok_or_else(|| AppError::NotFound(format!("no listing for {id}")))?;
        let next = listing.keeping_bid_from(previous);
        let record = self.with_record(id, |rec| next.apply_to(rec))?;
        holding.listing = Some(next);
        Ok(record)
    }

    pub fn remove_listing(&self, id: &str, scope: RemoveScope) -> Result<AssetRecord> {
        let mut holding = self
            .owned
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let current = holding
            .listing
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("no listing for {id}")))?;
        let remaining = current.without(scope);
        let record = self.with_record(id, |rec| match &remaining {
            Some(listing) => listing.apply_to(rec),
            None => unlist(rec),
        })?;
        holding.listing = remaining;
        Ok(record)
    }

    fn with_record(&self, id: &str, f: impl FnOnce(&mut AssetRecord)) -> Result<AssetRecord> {
        let mut slot = self
            .assets
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        f(&mut slot.record);
        Ok(slot.record.clone())
    }
}
