//! Host cells versus what the device is showing

use alloc::vec::Vec;

use super::output::OutputTable;
use crate::error::BufferError;

/// Half-open span of cells `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellRange {
    pub start: usize,
    pub end: usize,
}

impl CellRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Smallest span outside of which `old` and `new` agree
///
/// `None` when the slices are equal. Slices of different length compare over
/// the shorter one.
pub fn diff_range(old: &[u8], new: &[u8]) -> Option<CellRange> {
    let len = old.len().min(new.len());
    let start = (0..len).find(|&i| old[i] != new[i])?;
    let end = (start..len).rev().find(|&i| old[i] != new[i])? + 1;
    Some(CellRange { start, end })
}

/// Double buffer for one row of cells
///
/// `external` is what the device confirmed showing. `stage` translates new
/// host cells into `internal` and reports what changed; `commit` makes the
/// staged cells current once the write went out, `discard` forgets them so
/// the next `stage` retries.
#[derive(Debug, Clone, Default)]
pub struct CellBuffer {
    internal: Vec<u8>,
    external: Vec<u8>,
    pending: Option<CellRange>,
    force_refresh: bool,
}

impl CellBuffer {
    /// Buffer of `len` blank cells that will be sent in full on first use
    pub fn new(len: usize) -> Result<Self, BufferError> {
        let mut buffer = Self::default();
        buffer.resize(len)?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external.is_empty()
    }

    /// Translate `cells` and find what needs sending
    pub fn stage(&mut self, cells: &[u8], table: &OutputTable) -> Result<Option<CellRange>, BufferError> {
        if cells.len() != self.external.len() {
            return Err(BufferError::LengthMismatch {
                expected: self.external.len(),
                actual: cells.len(),
            });
        }

        for (out, &cell) in self.internal.iter_mut().zip(cells) {
            *out = table.translate(cell);
        }

        self.pending = if self.force_refresh && !self.internal.is_empty() {
            Some(CellRange {
                start: 0,
                end: self.internal.len(),
            })
        } else {
            diff_range(&self.external, &self.internal)
        };
        Ok(self.pending)
    }

    /// Device bytes of the staged cells
    pub fn staged(&self) -> &[u8] {
        &self.internal
    }

    /// Device bytes the display is known to show
    pub fn current(&self) -> &[u8] {
        &self.external
    }

    pub fn pending(&self) -> Option<CellRange> {
        self.pending
    }

    /// The staged write reached the device
    pub fn commit(&mut self) {
        if let Some(range) = self.pending.take() {
            self.external[range.start..range.end].copy_from_slice(&self.internal[range.start..range.end]);
        }
        self.force_refresh = false;
    }

    /// The staged write failed; keep the old view
    pub fn discard(&mut self) {
        self.pending = None;
        self.internal.copy_from_slice(&self.external);
    }

    /// Change the cell count; new cells are blank and the next write is full
    ///
    /// On failure both rows keep their old length and contents.
    pub fn resize(&mut self, len: usize) -> Result<(), BufferError> {
        for buf in [&mut self.internal, &mut self.external] {
            if len > buf.len() {
                buf.try_reserve(len - buf.len())
                    .map_err(|_| BufferError::OutOfMemory)?;
            }
        }
        self.internal.resize(len, 0);
        self.external.resize(len, 0);
        self.pending = None;
        self.force_refresh = true;
        Ok(())
    }

    /// The whole current row went out as part of another write
    pub fn mark_sent(&mut self) {
        self.force_refresh = false;
    }

    /// Send everything on the next write
    pub fn force_refresh(&mut self) {
        self.force_refresh = true;
    }

    pub fn needs_refresh(&self) -> bool {
        self.force_refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_range() {
        assert_eq!(diff_range(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(
            diff_range(&[1, 2, 3, 4], &[1, 9, 3, 8]),
            Some(CellRange { start: 1, end: 4 })
        );
        assert_eq!(diff_range(&[0], &[1]), Some(CellRange { start: 0, end: 1 }));
    }

    #[test]
    fn test_first_write_is_full() {
        let table = OutputTable::identity();
        let mut buffer = CellBuffer::new(4).unwrap();
        let range = buffer.stage(&[0, 0, 0, 0], &table).unwrap();
        assert_eq!(range, Some(CellRange { start: 0, end: 4 }));
        buffer.commit();

        // Same cells again: nothing to send
        assert_eq!(buffer.stage(&[0, 0, 0, 0], &table).unwrap(), None);
    }

    #[test]
    fn test_partial_update() {
        let table = OutputTable::identity();
        let mut buffer = CellBuffer::new(6).unwrap();
        buffer.stage(&[0; 6], &table).unwrap();
        buffer.commit();

        let range = buffer.stage(&[0, 0, 7, 0, 9, 0], &table).unwrap();
        assert_eq!(range, Some(CellRange { start: 2, end: 5 }));
        buffer.commit();
        assert_eq!(buffer.current(), &[0, 0, 7, 0, 9, 0]);
    }

    #[test]
    fn test_discard_retries_next_time() {
        let table = OutputTable::identity();
        let mut buffer = CellBuffer::new(3).unwrap();
        buffer.stage(&[0; 3], &table).unwrap();
        buffer.commit();

        assert!(buffer.stage(&[1, 0, 0], &table).unwrap().is_some());
        buffer.discard();
        assert_eq!(buffer.current(), &[0, 0, 0]);
        assert_eq!(
            buffer.stage(&[1, 0, 0], &table).unwrap(),
            Some(CellRange { start: 0, end: 1 })
        );
    }

    #[test]
    fn test_length_mismatch() {
        let mut buffer = CellBuffer::new(40).unwrap();
        assert_eq!(
            buffer.stage(&[0; 39], &OutputTable::identity()),
            Err(BufferError::LengthMismatch {
                expected: 40,
                actual: 39
            })
        );
    }

    #[test]
    fn test_resize_forces_refresh() {
        let table = OutputTable::identity();
        let mut buffer = CellBuffer::new(2).unwrap();
        buffer.stage(&[5, 5], &table).unwrap();
        buffer.commit();

        buffer.resize(4).unwrap();
        assert_eq!(buffer.current(), &[5, 5, 0, 0]);
        assert!(buffer.needs_refresh());
        assert_eq!(
            buffer.stage(&[5, 5, 0, 0], &table).unwrap(),
            Some(CellRange { start: 0, end: 4 })
        );
    }

    #[test]
    fn test_mark_sent_clears_refresh() {
        let table = OutputTable::identity();
        let mut buffer = CellBuffer::new(2).unwrap();
        buffer.force_refresh();
        buffer.mark_sent();
        assert_eq!(buffer.stage(&[0, 0], &table).unwrap(), None);
    }

    #[test]
    fn test_failed_resize_keeps_both_rows() {
        let table = OutputTable::identity();
        let mut buffer = CellBuffer::new(2).unwrap();
        buffer.stage(&[7, 8], &table).unwrap();
        buffer.commit();

        assert_eq!(buffer.resize(usize::MAX), Err(BufferError::OutOfMemory));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.current(), &[7, 8]);
        assert_eq!(buffer.staged(), &[7, 8]);
        assert!(!buffer.needs_refresh());
    }
}
