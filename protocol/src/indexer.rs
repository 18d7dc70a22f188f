//! # Indexer
//!
//! Drives the publisher over a block range. The header table, the payload
//! source and the CID table all live outside this crate; the indexer only
//! sees them through three small traits.
//!
//! ```text
//! missing_headers(start, end)
//!   └─ for each header, in order:
//!        fetch_payload(header) ── None ──────────────┐
//!          │ Some(payload)                            │
//!          ▼                                          │
//!        publisher.publish(payload)                   │
//!          ▼                                          │
//!        cids.create(header.id, cid_payload)          │
//!          ▼                                          ▼
//!        mark_header_checked(header.id) ◄─────────────┘
//! ```
//!
//! The first error stops the run. A header is only marked after its
//! publish and persist both succeeded, so a failed header shows up as
//! missing again on the next run.

use std::sync::Arc;

use primitive_types::H256;
use serde::Serialize;

use crate::eth::{CidPayload, IpldPayload};
use crate::publisher::{IpldPublisher, PublishError};

/// A header row that has not been checked yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRecord {
    pub id: i64,
    pub block_number: u64,
    pub hash: H256,
}

pub trait HeaderRepository: Send + Sync {
    /// Unchecked headers with `start <= number <= end`, in ascending order.
    fn missing_headers(&self, start: u64, end: u64) -> anyhow::Result<Vec<HeaderRecord>>;

    fn mark_header_checked(&self, header_id: i64) -> anyhow::Result<()>;
}

pub trait PayloadFetcher: Send + Sync {
    /// `None` means there is nothing to publish for this header.
    fn fetch_payload(&self, header: &HeaderRecord) -> anyhow::Result<Option<IpldPayload>>;
}

pub trait CidRepository: Send + Sync {
    fn create(&self, header_id: i64, cids: &CidPayload) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("listing missing headers in {start}..={end}: {error:#}")]
    Headers {
        start: u64,
        end: u64,
        error: anyhow::Error,
    },

    #[error("fetching payload for block {block_number}: {error:#}")]
    Fetch {
        block_number: u64,
        error: anyhow::Error,
    },

    #[error("publishing block {block_number}: {source}")]
    Publish {
        block_number: u64,
        #[source]
        source: PublishError,
    },

    #[error("persisting CIDs for block {block_number}: {error:#}")]
    Persist {
        block_number: u64,
        error: anyhow::Error,
    },

    #[error("marking header {header_id} checked: {error:#}")]
    Mark { header_id: i64, error: anyhow::Error },
}

/// What one [`Indexer::execute`] run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Missing headers found in the range.
    pub seen: usize,
    /// Headers whose payload was published and persisted.
    pub published: usize,
    /// Headers with nothing to publish.
    pub skipped: usize,
}

pub struct Indexer {
    headers: Arc<dyn HeaderRepository>,
    fetcher: Arc<dyn PayloadFetcher>,
    publisher: Arc<dyn IpldPublisher>,
    cids: Arc<dyn CidRepository>,
}

impl Indexer {
    pub fn new(
        headers: Arc<dyn HeaderRepository>,
        fetcher: Arc<dyn PayloadFetcher>,
        publisher: Arc<dyn IpldPublisher>,
        cids: Arc<dyn CidRepository>,
    ) -> Self {
        Self {
            headers,
            fetcher,
            publisher,
            cids,
        }
    }

    pub fn execute(&self, start: u64, end: u64) -> Result<IndexReport, IndexerError> {
        let missing = self
            .headers
            .missing_headers(start, end)
            .map_err(|error| IndexerError::Headers { start, end, error })?;
        tracing::info!(start, end, headers = missing.len(), "indexing missing headers");

        let mut report = IndexReport {
            seen: missing.len(),
            ..IndexReport::default()
        };

        for header in &missing {
            let block_number = header.block_number;
            let payload = self
                .fetcher
                .fetch_payload(header)
                .map_err(|error| IndexerError::Fetch {
                    block_number,
                    error,
                })?;

            match payload {
                None => {
                    tracing::debug!(block_number, "nothing to publish");
                    report.skipped += 1;
                }
                Some(payload) => {
                    let cids = self
                        .publisher
                        .publish(&payload)
                        .map_err(|source| IndexerError::Publish {
                            block_number,
                            source,
                        })?;
                    self.cids
                        .create(header.id, &cids)
                        .map_err(|error| IndexerError::Persist {
                            block_number,
                            error,
                        })?;
                    report.published += 1;
                }
            }

            self.headers
                .mark_header_checked(header.id)
                .map_err(|error| IndexerError::Mark {
                    header_id: header.id,
                    error,
                })?;
        }

        tracing::info!(
            published = report.published,
            skipped = report.skipped,
            "indexing run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::BlockBody;
    use crate::publisher::Publisher;
    use crate::storage::MemoryBlockstore;
    use parking_lot::Mutex;
    use primitive_types::U256;
    use std::collections::{BTreeMap, HashMap};

    // -- Fakes --------------------------------------------------------------

    #[derive(Default)]
    struct FakeHeaders {
        rows: Vec<HeaderRecord>,
        checked: Mutex<Vec<i64>>,
        fail_listing: bool,
    }

    impl HeaderRepository for FakeHeaders {
        fn missing_headers(&self, start: u64, end: u64) -> anyhow::Result<Vec<HeaderRecord>> {
            if self.fail_listing {
                anyhow::bail!("connection refused");
            }
            let checked = self.checked.lock();
            Ok(self
                .rows
                .iter()
                .filter(|h| (start..=end).contains(&h.block_number))
                .filter(|h| !checked.contains(&h.id))
                .cloned()
                .collect())
        }

        fn mark_header_checked(&self, header_id: i64) -> anyhow::Result<()> {
            self.checked.lock().push(header_id);
            Ok(())
        }
    }

    /// Serves a payload for every block number in `payloads`, nothing for
    /// the rest.
    #[derive(Default)]
    struct FakeFetcher {
        payloads: HashMap<u64, IpldPayload>,
    }

    impl PayloadFetcher for FakeFetcher {
        fn fetch_payload(&self, header: &HeaderRecord) -> anyhow::Result<Option<IpldPayload>> {
            Ok(self.payloads.get(&header.block_number).cloned())
        }
    }

    #[derive(Default)]
    struct FakeCids {
        rows: Mutex<Vec<(i64, CidPayload)>>,
        fail: bool,
    }

    impl CidRepository for FakeCids {
        fn create(&self, header_id: i64, cids: &CidPayload) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("unique constraint violated");
            }
            self.rows.lock().push((header_id, cids.clone()));
            Ok(())
        }
    }

    // -- Helpers ------------------------------------------------------------

    fn header(id: i64, block_number: u64) -> HeaderRecord {
        HeaderRecord {
            id,
            block_number,
            hash: H256::from_low_u64_be(block_number),
        }
    }

    fn payload(block_number: u64, header_rlp: Vec<u8>) -> IpldPayload {
        IpldPayload {
            block_hash: H256::from_low_u64_be(block_number),
            block_number,
            total_difficulty: U256::from(block_number),
            header_rlp,
            block_body: BlockBody::default(),
            trx_meta_data: Vec::new(),
            receipts: Vec::new(),
            receipt_meta_data: Vec::new(),
            state_nodes: BTreeMap::new(),
            storage_nodes: BTreeMap::new(),
        }
    }

    fn indexer(
        headers: Arc<FakeHeaders>,
        fetcher: FakeFetcher,
        cids: Arc<FakeCids>,
    ) -> Indexer {
        let store = Arc::new(MemoryBlockstore::new());
        Indexer::new(
            headers,
            Arc::new(fetcher),
            Arc::new(Publisher::new(store)),
            cids,
        )
    }

    // -- Tests --------------------------------------------------------------

    #[test]
    fn publishes_persists_and_marks_each_header() {
        let headers = Arc::new(FakeHeaders {
            rows: vec![header(1, 10), header(2, 11), header(3, 12)],
            ..Default::default()
        });
        let mut fetcher = FakeFetcher::default();
        fetcher.payloads.insert(10, payload(10, vec![0xc1, 0x0a]));
        fetcher.payloads.insert(12, payload(12, vec![0xc1, 0x0c]));
        let cids = Arc::new(FakeCids::default());

        let report = indexer(headers.clone(), fetcher, cids.clone())
            .execute(10, 12)
            .unwrap();

        assert_eq!(
            report,
            IndexReport {
                seen: 3,
                published: 2,
                skipped: 1
            }
        );
        assert_eq!(*headers.checked.lock(), vec![1, 2, 3]);
        let rows = cids.rows.lock();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1.block_number, "10");
        assert_eq!(rows[1].0, 3);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let headers = Arc::new(FakeHeaders {
            rows: vec![header(1, 4), header(2, 5), header(3, 6), header(4, 7)],
            ..Default::default()
        });

        let report = indexer(headers.clone(), FakeFetcher::default(), Arc::default())
            .execute(5, 6)
            .unwrap();

        assert_eq!(report.seen, 2);
        assert_eq!(*headers.checked.lock(), vec![2, 3]);
    }

    #[test]
    fn second_run_finds_nothing_missing() {
        let headers = Arc::new(FakeHeaders {
            rows: vec![header(1, 1), header(2, 2)],
            ..Default::default()
        });
        let run = || {
            indexer(headers.clone(), FakeFetcher::default(), Arc::default())
                .execute(0, 10)
                .unwrap()
        };

        assert_eq!(run().seen, 2);
        assert_eq!(run(), IndexReport::default());
    }

    #[test]
    fn failed_publish_stops_run_and_leaves_header_unmarked() {
        let headers = Arc::new(FakeHeaders {
            rows: vec![header(1, 20), header(2, 21), header(3, 22)],
            ..Default::default()
        });
        let mut fetcher = FakeFetcher::default();
        fetcher.payloads.insert(20, payload(20, vec![0xc1, 0x14]));
        // Not an RLP list, so the header putter refuses it.
        fetcher.payloads.insert(21, payload(21, vec![0x81, 0x15]));
        fetcher.payloads.insert(22, payload(22, vec![0xc1, 0x16]));
        let cids = Arc::new(FakeCids::default());

        let err = indexer(headers.clone(), fetcher, cids.clone())
            .execute(20, 22)
            .unwrap_err();

        assert!(matches!(
            err,
            IndexerError::Publish {
                block_number: 21,
                ..
            }
        ));
        assert_eq!(*headers.checked.lock(), vec![1]);
        assert_eq!(cids.rows.lock().len(), 1);
    }

    #[test]
    fn failed_persist_leaves_header_unmarked() {
        let headers = Arc::new(FakeHeaders {
            rows: vec![header(7, 30)],
            ..Default::default()
        });
        let mut fetcher = FakeFetcher::default();
        fetcher.payloads.insert(30, payload(30, vec![0xc1, 0x1e]));
        let cids = Arc::new(FakeCids {
            fail: true,
            ..Default::default()
        });

        let err = indexer(headers.clone(), fetcher, cids).execute(30, 30).unwrap_err();

        assert!(matches!(err, IndexerError::Persist { block_number: 30, .. }));
        assert!(err.to_string().contains("unique constraint"));
        assert!(headers.checked.lock().is_empty());
    }

    #[test]
    fn listing_failure_is_reported_with_range() {
        let headers = Arc::new(FakeHeaders {
            fail_listing: true,
            ..Default::default()
        });

        let err = indexer(headers, FakeFetcher::default(), Arc::default())
            .execute(100, 200)
            .unwrap_err();

        assert!(matches!(err, IndexerError::Headers { start: 100, end: 200, .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
