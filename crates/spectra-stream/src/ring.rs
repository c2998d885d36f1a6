//! Fixed-capacity circular store of spectral rows.
//!
//! Positions are monotonic `u64` counters; the physical row of position `p`
//! is `p % capacity`. The writer never blocks: when it laps the reader the
//! oldest unread rows are overwritten and the read position is pulled
//! forward so `available() <= capacity()` always holds.

/// Most values a ring stores, `capacity * width`. Larger requests are
/// clamped to this many values by reducing the row count.
pub const MAX_RING_VALUES: usize = 1 << 22;

/// Circular buffer of `capacity` rows, each `width` values wide.
#[derive(Debug, Clone)]
pub struct SpectrumRing {
    width: usize,
    capacity: usize,
    data: Vec<f32>,
    staging: Vec<f32>,
    latest: Vec<f32>,
    has_latest: bool,
    write_pos: u64,
    read_pos: u64,
    overwritten: u64,
}

impl SpectrumRing {
    /// Creates a ring of `capacity` rows of `width` values (both at least 1).
    ///
    /// `capacity` is reduced so the ring stays within [`MAX_RING_VALUES`];
    /// a single row is always kept even when `width` alone exceeds it.
    pub fn new(capacity: usize, width: usize) -> Self {
        let width = width.max(1);
        let max_rows = (MAX_RING_VALUES / width).max(1);
        if capacity > max_rows {
            tracing::warn!(capacity, width, max_rows, "spectrum ring: capacity clamped");
        }
        let capacity = capacity.clamp(1, max_rows);
        Self {
            width,
            capacity,
            data: vec![0.0; capacity * width],
            staging: vec![0.0; capacity * width],
            latest: vec![0.0; width],
            has_latest: false,
            write_pos: 0,
            read_pos: 0,
            overwritten: 0,
        }
    }

    /// Row width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows the ring holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total rows ever written since creation or the last resize.
    pub fn write_pos(&self) -> u64 {
        self.write_pos
    }

    /// Position of the oldest unread row.
    pub fn read_pos(&self) -> u64 {
        self.read_pos
    }

    /// Unread rows; always `write_pos - read_pos`.
    pub fn available(&self) -> usize {
        (self.write_pos - self.read_pos) as usize
    }

    /// True when nothing is waiting to be read.
    pub fn is_empty(&self) -> bool {
        self.write_pos == self.read_pos
    }

    /// Unread rows lost because the writer lapped the reader.
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    /// The most recently pushed row, regardless of consumption.
    pub fn latest(&self) -> Option<&[f32]> {
        self.has_latest.then_some(self.latest.as_slice())
    }

    /// Appends a row. Shorter frames are zero-padded, longer ones truncated.
    pub fn push(&mut self, frame: &[f32]) {
        self.write_row_with(|row| {
            let n = frame.len().min(row.len());
            row[..n].copy_from_slice(&frame[..n]);
            row[n..].fill(0.0);
        });
    }

    /// Appends a row decoded from `count` little-endian `f32` values starting
    /// at byte `offset` of `bytes`.
    ///
    /// Requests reaching past the end are truncated to the whole values
    /// present. An aligned region on a little-endian host is viewed in place
    /// through `bytemuck`; anything else is decoded straight into the
    /// destination row. Neither path allocates.
    pub fn push_from_raw_bytes(&mut self, bytes: &[u8], offset: usize, count: usize) {
        const VALUE: usize = size_of::<f32>();

        let start = offset.min(bytes.len());
        let whole = (bytes.len() - start) / VALUE;
        let region = &bytes[start..start + count.min(whole) * VALUE];

        if cfg!(target_endian = "little")
            && let Ok(view) = bytemuck::try_cast_slice::<u8, f32>(region)
        {
            self.push(view);
            return;
        }

        self.write_row_with(|row| {
            let mut values = region
                .chunks_exact(VALUE)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
            for slot in row.iter_mut() {
                *slot = values.next().unwrap_or(0.0);
            }
        });
    }

    /// The `index`-th unread row (0 is the oldest), if it exists.
    pub fn get_row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.available() {
            return None;
        }
        let physical = self.physical(self.read_pos + index as u64);
        Some(&self.data[physical * self.width..(physical + 1) * self.width])
    }

    /// Marks up to `n` rows as read and returns how many were.
    pub fn consume(&mut self, n: usize) -> usize {
        let n = n.min(self.available());
        self.read_pos += n as u64;
        n
    }

    /// Up to `min(available, max_rows)` unread rows in order, without
    /// consuming them.
    ///
    /// A range that does not wrap is returned as a view into the backing
    /// store; a wrapping range is copied into the pre-allocated staging area.
    pub fn assemble_block(&mut self, max_rows: usize) -> RowBlock<'_> {
        let rows = self.available().min(max_rows);
        let width = self.width;
        if rows == 0 {
            return RowBlock::new(&[], width, true);
        }

        let start = self.physical(self.read_pos);
        if start + rows <= self.capacity {
            return RowBlock::new(&self.data[start * width..(start + rows) * width], width, true);
        }

        let head_rows = self.capacity - start;
        let tail_rows = rows - head_rows;
        let head_len = head_rows * width;
        self.staging[..head_len].copy_from_slice(&self.data[start * width..]);
        self.staging[head_len..rows * width].copy_from_slice(&self.data[..tail_rows * width]);
        RowBlock::new(&self.staging[..rows * width], width, false)
    }

    /// Reallocates for a new row width, discarding every buffered row.
    pub fn resize(&mut self, new_width: usize) {
        let dropped = self.available();
        *self = Self::new(self.capacity, new_width);
        tracing::debug!(width = self.width, dropped, "spectrum ring: resized");
    }

    fn physical(&self, position: u64) -> usize {
        (position % self.capacity as u64) as usize
    }

    fn write_row_with(&mut self, fill: impl FnOnce(&mut [f32])) {
        let physical = self.physical(self.write_pos);
        let row = &mut self.data[physical * self.width..(physical + 1) * self.width];
        fill(row);
        self.latest.copy_from_slice(row);
        self.has_latest = true;
        self.write_pos += 1;

        if self.available() > self.capacity {
            let lapped = self.write_pos - self.capacity as u64;
            self.overwritten += lapped - self.read_pos;
            self.read_pos = lapped;
        }
    }
}

/// A contiguous run of rows returned by [`SpectrumRing::assemble_block`].
#[derive(Debug, Clone, Copy)]
pub struct RowBlock<'a> {
    data: &'a [f32],
    width: usize,
    zero_copy: bool,
}

impl<'a> RowBlock<'a> {
    fn new(data: &'a [f32], width: usize, zero_copy: bool) -> Self {
        Self {
            data,
            width,
            zero_copy,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.data.len() / self.width
    }

    /// Row width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// True if the block holds no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if the block borrows the ring's backing store directly.
    pub fn is_zero_copy(&self) -> bool {
        self.zero_copy
    }

    /// Rows laid out back to back.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Row `index` of the block.
    pub fn row(&self, index: usize) -> Option<&'a [f32]> {
        let start = index.checked_mul(self.width)?;
        self.data.get(start..start + self.width)
    }

    /// Iterates rows oldest first.
    pub fn iter(&self) -> std::slice::ChunksExact<'a, f32> {
        self.data.chunks_exact(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: f32, width: usize) -> Vec<f32> {
        vec![value; width]
    }

    #[test]
    fn push_and_read_in_order() {
        let mut ring = SpectrumRing::new(4, 3);
        ring.push(&row(1.0, 3));
        ring.push(&row(2.0, 3));
        assert_eq!(ring.available(), 2);
        assert_eq!(ring.get_row(0), Some(&[1.0, 1.0, 1.0][..]));
        assert_eq!(ring.get_row(1), Some(&[2.0, 2.0, 2.0][..]));
        assert_eq!(ring.get_row(2), None);
        assert_eq!(ring.latest(), Some(&[2.0, 2.0, 2.0][..]));

        assert_eq!(ring.consume(5), 2);
        assert!(ring.is_empty());
        assert_eq!(ring.latest(), Some(&[2.0, 2.0, 2.0][..]));
    }

    #[test]
    fn frames_are_padded_or_truncated() {
        let mut ring = SpectrumRing::new(2, 4);
        ring.push(&[1.0, 2.0]);
        ring.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ring.get_row(0), Some(&[1.0, 2.0, 0.0, 0.0][..]));
        assert_eq!(ring.get_row(1), Some(&[1.0, 2.0, 3.0, 4.0][..]));
    }

    #[test]
    fn writer_lapping_reader_drops_oldest() {
        let mut ring = SpectrumRing::new(3, 1);
        for v in 0..5 {
            ring.push(&[v as f32]);
        }
        assert_eq!(ring.available(), 3);
        assert_eq!(ring.overwritten(), 2);
        assert_eq!(ring.read_pos(), 2);
        assert_eq!(ring.get_row(0), Some(&[2.0][..]));
        assert_eq!(ring.get_row(2), Some(&[4.0][..]));
    }

    #[test]
    fn block_is_zero_copy_until_it_wraps() {
        let mut ring = SpectrumRing::new(4, 2);
        for v in 0..3 {
            ring.push(&row(v as f32, 2));
        }
        let block = ring.assemble_block(8);
        assert!(block.is_zero_copy());
        assert_eq!(block.rows(), 3);
        assert_eq!(block.row(2), Some(&[2.0, 2.0][..]));

        ring.consume(2);
        ring.push(&row(3.0, 2));
        ring.push(&row(4.0, 2));
        // Rows 2, 3, 4 occupy physical slots 2, 3, 0.
        let block = ring.assemble_block(8);
        assert!(!block.is_zero_copy());
        let firsts: Vec<f32> = block.iter().map(|r| r[0]).collect();
        assert_eq!(firsts, vec![2.0, 3.0, 4.0]);
        assert_eq!(ring.available(), 3);
    }

    #[test]
    fn block_respects_max_rows() {
        let mut ring = SpectrumRing::new(8, 1);
        for v in 0..5 {
            ring.push(&[v as f32]);
        }
        assert_eq!(ring.assemble_block(2).as_slice(), &[0.0, 1.0]);
        assert!(ring.assemble_block(0).is_empty());
    }

    #[test]
    fn resize_resets_cursors() {
        let mut ring = SpectrumRing::new(4, 2);
        ring.push(&[1.0, 1.0]);
        ring.push(&[2.0, 2.0]);
        ring.consume(1);
        ring.resize(8);
        assert_eq!(ring.width(), 8);
        assert_eq!(ring.write_pos(), 0);
        assert_eq!(ring.read_pos(), 0);
        assert_eq!(ring.latest(), None);
        ring.push(&[1.0; 8]);
        assert_eq!(ring.get_row(0).map(<[f32]>::len), Some(8));
    }

    #[test]
    fn oversized_capacity_is_clamped() {
        let mut ring = SpectrumRing::new(usize::MAX, 1024);
        assert_eq!(ring.capacity(), MAX_RING_VALUES / 1024);
        ring.push(&[1.0; 1024]);
        assert_eq!(ring.available(), 1);
    }

    #[test]
    fn raw_bytes_aligned_and_shifted() {
        let values = [1.5f32, -2.0, 3.25, 4.0];
        let aligned: &[u8] = bytemuck::cast_slice(&values);

        let mut shifted = vec![0u8; 3];
        shifted.extend_from_slice(aligned);

        let mut ring = SpectrumRing::new(4, 4);
        ring.push_from_raw_bytes(aligned, 0, 4);
        ring.push_from_raw_bytes(&shifted, 3, 4);
        ring.push_from_raw_bytes(&shifted, 7, 2);
        assert_eq!(ring.get_row(0), Some(&values[..]));
        assert_eq!(ring.get_row(1), Some(&values[..]));
        assert_eq!(ring.get_row(2), Some(&[-2.0, 3.25, 0.0, 0.0][..]));
    }

    #[test]
    fn raw_bytes_out_of_range_is_truncated() {
        let mut bytes = Vec::new();
        for v in [7.0f32, 8.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.push(0xff);

        let mut ring = SpectrumRing::new(2, 4);
        ring.push_from_raw_bytes(&bytes, 0, 10);
        assert_eq!(ring.get_row(0), Some(&[7.0, 8.0, 0.0, 0.0][..]));
        ring.push_from_raw_bytes(&bytes, 100, 4);
        assert_eq!(ring.get_row(1), Some(&[0.0; 4][..]));
    }
}
