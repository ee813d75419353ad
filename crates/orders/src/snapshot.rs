use crate::ListingStore;
use alloy::primitives::Address;
use core::{cmp::Ordering, time::Duration};
use std::collections::BTreeMap;
use steptract_types::{compare_token_ids, ListingAction, ListingRecord};
use tracing::debug;

/// Token id ordered numerically where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenKey(String);

impl Ord for TokenKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_token_ids(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for TokenKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors returned by [`MarketSnapshot::refresh_from`]. The snapshot is
/// unchanged when either occurs.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SnapshotError {
    /// The store failed.
    #[error("failed to fetch listings: {0}")]
    Store(#[source] BoxError),
    /// The store did not answer in time.
    #[error("listing fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Token ids that differ between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Records that were not present before.
    pub added: Vec<String>,
    /// Records whose contents changed.
    pub changed: Vec<String>,
    /// Records that are no longer present.
    pub removed: Vec<String>,
}

impl SnapshotDiff {
    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// The last fetched set of listing records.
///
/// Refreshing replaces the whole set and reports which token ids were
/// added, changed, or removed, so a view only needs to redraw those.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    records: BTreeMap<TokenKey, ListingRecord>,
}

impl MarketSnapshot {
    /// An empty snapshot.
    pub const fn new() -> Self {
        Self { records: BTreeMap::new() }
    }

    /// Replace the snapshot with `records`. Later duplicates of a token id
    /// win.
    pub fn refresh(&mut self, records: Vec<ListingRecord>) -> SnapshotDiff {
        let next: BTreeMap<_, _> =
            records.into_iter().map(|record| (TokenKey(record.tokenid.clone()), record)).collect();

        let mut diff = SnapshotDiff::default();
        for (key, record) in &next {
            match self.records.get(key) {
                None => diff.added.push(key.0.clone()),
                Some(previous) if previous != record => diff.changed.push(key.0.clone()),
                Some(_) => {}
            }
        }
        diff.removed = self
            .records
            .keys()
            .filter(|key| !next.contains_key(key))
            .map(|key| key.0.clone())
            .collect();

        self.records = next;
        diff
    }

    /// Fetch every record from `store`, waiting at most `timeout`, and
    /// refresh.
    pub async fn refresh_from<S: ListingStore>(
        &mut self,
        store: &S,
        timeout: Duration,
    ) -> Result<SnapshotDiff, SnapshotError> {
        let records = tokio::time::timeout(timeout, store.fetch_listings())
            .await
            .map_err(|_| SnapshotError::Timeout(timeout))?
            .map_err(|error| SnapshotError::Store(Box::new(error)))?;
        let diff = self.refresh(records);
        debug!(
            added = diff.added.len(),
            changed = diff.changed.len(),
            removed = diff.removed.len(),
            "snapshot refreshed"
        );
        Ok(diff)
    }

    /// The record for `token_id`.
    pub fn get(&self, token_id: &str) -> Option<&ListingRecord> {
        self.records.get(&TokenKey(token_id.to_owned()))
    }

    /// All records, by token id.
    pub fn records(&self) -> impl Iterator<Item = &ListingRecord> {
        self.records.values()
    }

    /// Records with an active listing, by token id.
    pub fn listed(&self) -> impl Iterator<Item = &ListingRecord> {
        self.records().filter(|record| record.is_listed())
    }

    /// Every record with what `viewer` can do with it.
    pub fn view_for(&self, viewer: Option<Address>) -> Vec<(&ListingRecord, ListingAction)> {
        self.records().map(|record| (record, record.action_for(viewer))).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn listed(tokenid: &str, seller: Address) -> ListingRecord {
        let mut record = ListingRecord::new(tokenid);
        record.price = Decimal::ONE;
        record.seller_address = Some(seller);
        record
    }

    fn owned(tokenid: &str, owner: Address) -> ListingRecord {
        let mut record = ListingRecord::new(tokenid);
        record.buyer_address = Some(owner);
        record
    }

    #[test]
    fn refresh_reports_differences() {
        let alice = Address::repeat_byte(0xa);
        let bob = Address::repeat_byte(0xb);
        let mut snapshot = MarketSnapshot::new();

        let diff = snapshot.refresh(vec![listed("10", alice), owned("2", bob)]);
        assert_eq!(diff.added, vec!["2", "10"]);
        assert!(diff.changed.is_empty() && diff.removed.is_empty());

        let diff = snapshot.refresh(vec![owned("10", bob), owned("3", alice)]);
        assert_eq!(diff.added, vec!["3"]);
        assert_eq!(diff.changed, vec!["10"]);
        assert_eq!(diff.removed, vec!["2"]);

        let diff = snapshot.refresh(vec![owned("3", alice), owned("10", bob)]);
        assert!(diff.is_empty());
    }

    #[test]
    fn orders_numerically_and_views() {
        let alice = Address::repeat_byte(0xa);
        let bob = Address::repeat_byte(0xb);
        let mut snapshot = MarketSnapshot::new();
        snapshot.refresh(vec![listed("10", alice), owned("9", alice), listed("1", bob)]);

        let ids: Vec<_> = snapshot.records().map(|r| r.tokenid.as_str()).collect();
        assert_eq!(ids, ["1", "9", "10"]);
        assert_eq!(snapshot.listed().count(), 2);
        assert_eq!(snapshot.get("9").and_then(|r| r.buyer_address), Some(alice));

        let actions: Vec<_> = snapshot.view_for(Some(alice)).into_iter().map(|(_, a)| a).collect();
        assert_eq!(
            actions,
            [ListingAction::Buy, ListingAction::ListForSale, ListingAction::OwnListing]
        );
        assert_eq!(snapshot.view_for(None)[1].1, ListingAction::NotOwned);
    }
}
