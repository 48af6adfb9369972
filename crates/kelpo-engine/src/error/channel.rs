use std::collections::VecDeque;

use super::{ErrorKind, ErrorRecord};

/// Default number of records an `ErrorChannel` holds.
pub const DEFAULT_ERROR_CAPACITY: usize = 16;

/// Bounded FIFO of error records.
///
/// Overflow policy:
/// - the oldest slot is turned into a `TooManyErrors` sentinel (kept at the front)
/// - the oldest remaining real record is evicted to make room
/// - the sentinel's context counts how many records were dropped so far
///
/// The queue therefore never exceeds its capacity, always keeps the newest
/// reports, and makes it visible that reports were lost.
#[derive(Debug)]
pub struct ErrorChannel {
    records: VecDeque<ErrorRecord>,
    capacity: usize,
    dropped: usize,
}

impl ErrorChannel {
    /// Creates a channel holding at most `capacity` records.
    ///
    /// Capacities below 2 are raised to 2: the sentinel needs a slot of its own
    /// next to the newest record.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ERROR_CAPACITY)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates queued records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    /// Queues an error.
    pub fn report(&mut self, kind: ErrorKind, context: Option<&str>) {
        self.push(ErrorRecord {
            kind,
            context: context.map(str::to_owned),
        });
    }

    /// Queues an already-built record (typically an `Err` from a backend call).
    pub fn push(&mut self, record: ErrorRecord) {
        log::warn!("kelpo error [{}]: {record}", record.kind.code());

        if self.records.len() >= self.capacity {
            self.make_room();
        }
        self.records.push_back(record);
    }

    /// Empties the queue, returning records in insertion order.
    pub fn drain(&mut self) -> Vec<ErrorRecord> {
        self.dropped = 0;
        self.records.drain(..).collect()
    }

    fn make_room(&mut self) {
        let front_is_sentinel = self
            .records
            .front()
            .is_some_and(|r| r.kind == ErrorKind::TooManyErrors && self.dropped > 0);

        if !front_is_sentinel {
            // The oldest record is overwritten by the sentinel.
            self.records.pop_front();
            self.dropped += 1;
            self.records.push_front(ErrorRecord::bare(ErrorKind::TooManyErrors));
        }

        // Evict the oldest real record behind the sentinel.
        if self.records.remove(1).is_some() {
            self.dropped += 1;
        }

        if let Some(sentinel) = self.records.front_mut() {
            sentinel.context = Some(format!("{} older errors dropped", self.dropped));
        }
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Feature;

    fn api(n: usize) -> ErrorRecord {
        ErrorRecord::api_call(format!("call {n}"))
    }

    #[test]
    fn drain_returns_insertion_order_and_empties() {
        let mut ch = ErrorChannel::with_capacity(4);
        ch.push(api(0));
        ch.report(ErrorKind::OutOfVideoMemory, None);
        ch.report(
            ErrorKind::UnsupportedFeature(Feature::ZBuffering),
            Some("no depth buffer"),
        );

        let drained = ch.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], api(0));
        assert_eq!(drained[1].kind, ErrorKind::OutOfVideoMemory);
        assert_eq!(drained[2].kind, ErrorKind::UnsupportedFeature(Feature::ZBuffering));
        assert!(ch.is_empty());
    }

    #[test]
    fn overflow_keeps_capacity_newest_and_sentinel() {
        let mut ch = ErrorChannel::with_capacity(4);
        for i in 0..10 {
            ch.push(api(i));
        }

        assert_eq!(ch.len(), 4);
        let drained = ch.drain();
        assert_eq!(drained[0].kind, ErrorKind::TooManyErrors);
        assert_eq!(drained[0].context.as_deref(), Some("7 older errors dropped"));
        assert_eq!(&drained[1..], &[api(7), api(8), api(9)]);
    }

    #[test]
    fn first_overflow_replaces_oldest_with_sentinel() {
        let mut ch = ErrorChannel::with_capacity(3);
        ch.push(api(0));
        ch.push(api(1));
        ch.push(api(2));
        ch.push(api(3));

        let drained = ch.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].kind, ErrorKind::TooManyErrors);
        assert_eq!(&drained[1..], &[api(2), api(3)]);
    }

    #[test]
    fn reported_sentinel_is_not_mistaken_for_overflow() {
        let mut ch = ErrorChannel::with_capacity(2);
        ch.report(ErrorKind::TooManyErrors, Some("from caller"));
        ch.push(api(1));
        ch.push(api(2));

        let drained = ch.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, ErrorKind::TooManyErrors);
        assert_eq!(drained[0].context.as_deref(), Some("2 older errors dropped"));
        assert_eq!(drained[1], api(2));
    }

    #[test]
    fn tiny_capacity_is_raised() {
        assert_eq!(ErrorChannel::with_capacity(0).capacity(), 2);
        assert_eq!(ErrorChannel::new().capacity(), DEFAULT_ERROR_CAPACITY);
    }

    #[test]
    fn drain_resets_drop_counter() {
        let mut ch = ErrorChannel::with_capacity(2);
        for i in 0..5 {
            ch.push(api(i));
        }
        ch.drain();

        ch.push(api(10));
        ch.push(api(11));
        ch.push(api(12));
        let drained = ch.drain();
        assert_eq!(drained[0].context.as_deref(), Some("2 older errors dropped"));
        assert_eq!(drained[1], api(12));
    }
}
