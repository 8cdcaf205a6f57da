//! Turning polled listings into a stream of new items.
//!
//! Listings come newest first and overlap from one poll to the next. A
//! `NewItemStream` remembers a bounded window of recent ids and yields only
//! items it hasn't seen, oldest first.

use std::collections::{HashSet, VecDeque};

use crate::effects::{CommentData, ThreadData};

/// Something with a stable platform id.
pub trait Identified {
    fn item_id(&self) -> &str;
}

impl Identified for ThreadData {
    fn item_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Identified for CommentData {
    fn item_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A bounded set of recently seen ids; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct RecentIds {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl RecentIds {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Records `id`. Returns false if it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity
            && let Some(evicted) = self.order.pop_front()
        {
            self.members.remove(&evicted);
        }
        self.order.push_back(id.to_string());
        self.members.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Deduplicates successive listings.
#[derive(Debug, Clone)]
pub struct NewItemStream {
    seen: RecentIds,
    skip_next: bool,
}

impl NewItemStream {
    /// With `skip_existing`, the first batch only primes the window.
    pub fn new(capacity: usize, skip_existing: bool) -> Self {
        Self {
            seen: RecentIds::new(capacity),
            skip_next: skip_existing,
        }
    }

    /// Takes a newest-first listing and returns unseen items, oldest first.
    pub fn accept<T: Identified>(&mut self, batch: Vec<T>) -> Vec<T> {
        let skip = std::mem::take(&mut self.skip_next);
        let fresh: Vec<T> = batch
            .into_iter()
            .rev()
            .filter(|item| self.seen.insert(item.item_id()))
            .collect();
        if skip { Vec::new() } else { fresh }
    }
}
