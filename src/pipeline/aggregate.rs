// src/pipeline/aggregate.rs

//! Book list aggregation pipeline.
//!
//! For an ordered list of books, drives the cover resolver and the
//! catalogue lookup per book, strictly sequentially so the shared rate
//! limiter stays honest, and yields a snapshot after every book for
//! progressive rendering. A run that has been superseded by a newer one
//! stops yielding (and stops issuing outbound calls) at the next book
//! boundary.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::Stream;
use futures::stream;

use crate::models::{AvailabilityRecord, AvailabilityStatus, Book};
use crate::services::{CatalogueClient, CoverResolver};

/// Partial or final result of an aggregation run.
///
/// Maps are keyed by ISBN and grow by one entry per processed book.
/// The terminal snapshot carries `complete = true` and the full maps.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Run token; stale snapshots carry an older generation
    pub generation: u64,

    /// Resolved cover URL per ISBN (None when both sources failed)
    pub covers: HashMap<String, Option<String>>,

    /// Aggregated display status per ISBN
    pub availability: HashMap<String, AvailabilityStatus>,

    /// Raw per-copy availability records per ISBN
    pub detail: HashMap<String, Vec<AvailabilityRecord>>,

    /// True only on the terminal snapshot
    pub complete: bool,
}

struct RunState {
    queue: VecDeque<Book>,
    covers: HashMap<String, Option<String>>,
    availability: HashMap<String, AvailabilityStatus>,
    detail: HashMap<String, Vec<AvailabilityRecord>>,
    done: bool,
}

/// Drives per-book metadata aggregation over the shared services.
pub struct Aggregator {
    covers: Arc<CoverResolver>,
    catalogue: Arc<CatalogueClient>,
    generation: AtomicU64,
}

impl Aggregator {
    /// Create an aggregator over the shared resolver and catalogue client.
    pub fn new(covers: Arc<CoverResolver>, catalogue: Arc<CatalogueClient>) -> Self {
        Self {
            covers,
            catalogue,
            generation: AtomicU64::new(0),
        }
    }

    /// Most recently started run's token.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Aggregate covers and availability for `books`, in order.
    ///
    /// Yields one snapshot per book plus a terminal snapshot with
    /// `complete = true`. An empty input yields only the terminal
    /// snapshot and issues zero outbound calls. Starting a new run
    /// supersedes any stream still being consumed; the stale stream
    /// ends at its next book boundary.
    pub fn aggregate(&self, books: Vec<Book>) -> impl Stream<Item = Snapshot> + '_ {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!(
            "Aggregation run {generation} starting over {} book(s)",
            books.len()
        );

        let state = RunState {
            queue: books.into_iter().collect(),
            covers: HashMap::new(),
            availability: HashMap::new(),
            detail: HashMap::new(),
            done: false,
        };

        stream::unfold(state, move |mut state| async move {
            if state.done {
                return None;
            }
            if self.current_generation() != generation {
                log::debug!("Aggregation run {generation} superseded, stopping");
                return None;
            }

            match state.queue.pop_front() {
                Some(book) => {
                    self.process_book(&book, &mut state).await;
                    Some((self.snapshot(&state, generation, false), state))
                }
                None => {
                    state.done = true;
                    log::info!("Aggregation run {generation} complete");
                    Some((self.snapshot(&state, generation, true), state))
                }
            }
        })
    }

    /// Resolve one book: cover, then catalogue record, then availability.
    async fn process_book(&self, book: &Book, state: &mut RunState) {
        let cover = self.covers.resolve(&book.isbn).await;
        state.covers.insert(book.isbn.clone(), cover);

        let record = self.catalogue.search_title(&book.title).await;
        let records = match record {
            Some(record) => self.catalogue.get_availability(&record.brn).await,
            None => Vec::new(),
        };

        // classify maps an empty record list to NotFound, covering both
        // "no catalogue record" and "record with no copies".
        let status = AvailabilityStatus::classify(&records);
        state.availability.insert(book.isbn.clone(), status);
        state.detail.insert(book.isbn.clone(), records);
    }

    fn snapshot(&self, state: &RunState, generation: u64, complete: bool) -> Snapshot {
        Snapshot {
            generation,
            covers: state.covers.clone(),
            availability: state.availability.clone(),
            detail: state.detail.clone(),
            complete,
        }
    }
}
