use std::ops::Range;

/// A contiguous slice of the structure set processed as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based batch number, used in log messages.
    pub id: usize,
    /// Structure indices covered by this batch.
    pub range: Range<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Splits `total` structures into batches of `batch_size`; the last batch may
/// be shorter. A `batch_size` of zero is treated as one.
pub fn make_batches(total: usize, batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1);
    (0..total)
        .step_by(size)
        .enumerate()
        .map(|(i, start)| Batch {
            id: i + 1,
            range: start..(start + size).min(total),
        })
        .collect()
}
