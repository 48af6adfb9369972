//! Growable contiguous record buffer.
//!
//! `Batch<T>` is the container every triangle flows through. Records are stored
//! by value in one allocation so the whole batch can be handed to a draw call as
//! a slice (or a raw pointer + count) without copying.
//!
//! Growth policy:
//! - capacity doubles, or jumps straight to the requested size if larger
//! - `clear` keeps the allocation, so steady-state frames never reallocate
//! - capacity never shrinks for the lifetime of the batch
//!
//! Aliasing: a growth event moves the backing store. Pointers obtained through
//! [`Batch::as_ptr`] are only valid until the next push that grows the batch.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum BatchError {
    /// Growing the backing store failed; the batch is unchanged.
    #[error("batch allocation failed while growing to {requested} records")]
    OutOfMemory { requested: usize },
}

/// Ordered, contiguous, growable sequence of fixed-size records.
#[derive(Debug, Clone)]
pub struct Batch<T: Copy> {
    records: Vec<T>,
}

impl<T: Copy> Batch<T> {
    /// Creates an empty batch with room for `initial_capacity` records.
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(initial_capacity),
        }
    }

    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Size in bytes of one record.
    #[inline]
    pub fn record_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Appends a copy of `record` and returns its index.
    pub fn push_copy(&mut self, record: &T) -> Result<usize, BatchError> {
        self.reserve(1)?;
        let index = self.records.len();
        self.records.push(*record);
        Ok(index)
    }

    /// Appends copies of every record in `records`.
    pub fn extend_from_slice(&mut self, records: &[T]) -> Result<(), BatchError> {
        self.reserve(records.len())?;
        self.records.extend_from_slice(records);
        Ok(())
    }

    /// Ensures room for `additional` more records using the geometric policy.
    pub fn reserve(&mut self, additional: usize) -> Result<(), BatchError> {
        let len = self.records.len();
        let required = len
            .checked_add(additional)
            .ok_or(BatchError::OutOfMemory { requested: usize::MAX })?;

        let capacity = self.records.capacity();
        if required <= capacity {
            return Ok(());
        }

        let target = capacity.saturating_mul(2).max(required);
        self.try_grow_to(target)
            .or_else(|_| self.try_grow_to(required))
            .map_err(|_| BatchError::OutOfMemory { requested: target })
    }

    /// Resets the record count to zero. The allocation is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Appends copies of every record in `self` to `other`.
    ///
    /// `self` is only read, so an immutable source mesh can be snapshotted into
    /// a scratch batch every frame and then mutated there.
    pub fn duplicate_into(&self, other: &mut Batch<T>) -> Result<(), BatchError> {
        other.extend_from_slice(&self.records)
    }

    /// Frees the backing store. Equivalent to dropping the batch.
    pub fn release(self) {
        log::trace!(
            "releasing batch ({} records, capacity {})",
            self.records.len(),
            self.records.capacity()
        );
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.records.get_mut(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.records
    }

    /// Raw pointer to the first record. Invalidated by any growth.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.records.as_ptr()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.records.iter_mut()
    }

    fn try_grow_to(&mut self, target: usize) -> Result<(), TryReserveError> {
        let additional = target - self.records.len();
        self.records.try_reserve_exact(additional)
    }
}

impl<T: Copy> Default for Batch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> std::ops::Deref for Batch<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.records
    }
}

impl<T: Copy> FromIterator<T> for Batch<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a, T: Copy> IntoIterator for &'a Batch<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq)]
    struct Rec {
        id: u32,
        payload: [u8; 12],
    }

    fn rec(id: u32) -> Rec {
        Rec { id, payload: [id as u8; 12] }
    }

    #[test]
    fn push_copy_preserves_count_and_order() {
        let mut batch = Batch::with_capacity(1);
        for i in 0..100 {
            assert_eq!(batch.push_copy(&rec(i)).unwrap(), i as usize);
        }

        assert_eq!(batch.len(), 100);
        for (i, r) in batch.iter().enumerate() {
            assert_eq!(*r, rec(i as u32));
        }
    }

    #[test]
    fn growth_doubles_capacity() {
        let mut batch: Batch<u32> = Batch::with_capacity(4);
        for i in 0..5 {
            batch.push_copy(&i).unwrap();
        }
        assert!(batch.capacity() >= 8);
    }

    #[test]
    fn growth_jumps_to_requested_size_when_larger() {
        let mut batch: Batch<u32> = Batch::with_capacity(2);
        let many: Vec<u32> = (0..50).collect();
        batch.extend_from_slice(&many).unwrap();
        assert!(batch.capacity() >= 50);
        assert_eq!(batch.as_slice(), many.as_slice());
    }

    #[test]
    fn clear_then_push_yields_exact_count_and_keeps_capacity() {
        let mut batch: Batch<Rec> = Batch::with_capacity(1);
        let mut last_capacity = batch.capacity();

        for m in [10usize, 3, 0, 25, 7] {
            batch.clear();
            for i in 0..m {
                batch.push_copy(&rec(i as u32)).unwrap();
            }
            assert_eq!(batch.len(), m);
            assert!(batch.capacity() >= last_capacity, "capacity shrank");
            last_capacity = batch.capacity();
        }
    }

    #[test]
    fn duplicate_into_appends_copies_and_leaves_source() {
        let src: Batch<u32> = (0..6).collect();
        let mut dst: Batch<u32> = Batch::new();
        dst.push_copy(&99).unwrap();

        src.duplicate_into(&mut dst).unwrap();
        dst.as_mut_slice()[1] = 1000;

        assert_eq!(dst.as_slice(), &[99, 1000, 1, 2, 3, 4, 5]);
        assert_eq!(src.as_slice(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn pointer_is_stable_without_growth() {
        let mut batch: Batch<u64> = Batch::with_capacity(8);
        batch.push_copy(&1).unwrap();
        let ptr = batch.as_ptr();
        batch.push_copy(&2).unwrap();
        assert_eq!(ptr, batch.as_ptr());
    }

    #[test]
    fn raw_byte_records_are_supported() {
        let mut batch: Batch<[u8; 3]> = Batch::new();
        batch.push_copy(&[1, 2, 3]).unwrap();
        assert_eq!(batch.record_size(), 3);
        assert_eq!(batch[0], [1, 2, 3]);
    }

    #[test]
    fn overflowing_reserve_reports_and_keeps_state() {
        let mut batch: Batch<u32> = (0..3).collect();
        let err = batch.reserve(usize::MAX).unwrap_err();
        assert!(matches!(err, BatchError::OutOfMemory { .. }));
        assert_eq!(batch.as_slice(), &[0, 1, 2]);
    }
}
