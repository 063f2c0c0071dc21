//! Stream reassembly
//!
//! Segments may arrive out of order, duplicated, overlapping, or partly
//! outside the window. The [`Reassembler`] stores what fits inside the
//! acceptance window as non-overlapping intervals keyed by absolute stream
//! index, and flushes the contiguous prefix into its output [`ByteStream`].

use crate::byte_stream::{ByteStream, Reader, Writer};
use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;

/// Out-of-order byte span assembler
#[derive(Debug)]
pub struct Reassembler {
    /// Assembled bytes are pushed here
    output: ByteStream,
    /// Stored spans, keyed by absolute start index. Sorted and non-overlapping.
    pending: BTreeMap<u64, Bytes>,
    /// Index of the next byte the output still needs
    next_index: u64,
    /// One past the last byte of the stream, once a final span has been seen
    end_index: Option<u64>,
}

impl Reassembler {
    /// Create a reassembler writing into `output`
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            output,
            pending: BTreeMap::new(),
            next_index: 0,
            end_index: None,
        }
    }

    /// Insert a span of bytes starting at absolute index `first_index`
    ///
    /// `is_last` marks `data` as ending the stream. Bytes outside the
    /// acceptance window `[next_index, next_index + available_capacity)` are
    /// dropped. Where spans overlap, the most recently inserted bytes win.
    pub fn insert(&mut self, first_index: u64, data: Bytes, is_last: bool) {
        let window_start = self.next_index;
        let window_end = window_start + self.output.available_capacity();
        let span_end = first_index + data.len() as u64;

        // The end of stream is known even when the bytes themselves are clipped
        if is_last {
            self.end_index = Some(span_end);
        }

        let start = first_index.max(window_start);
        let end = span_end.min(window_end);
        if start >= end {
            tracing::trace!(
                first_index,
                len = data.len(),
                window_start,
                window_end,
                "span outside acceptance window"
            );
            self.close_if_done();
            return;
        }

        let clipped = data.slice((start - first_index) as usize..(end - first_index) as usize);
        self.store(start, clipped);
        self.flush();
        self.close_if_done();
    }

    /// Store `data` at `start`, absorbing every interval it touches
    fn store(&mut self, start: u64, data: Bytes) {
        let end = start + data.len() as u64;

        // Predecessor that reaches into (or up to) the new span
        let predecessor = self
            .pending
            .range(..start)
            .next_back()
            .filter(|&(&pred_start, pred)| pred_start + pred.len() as u64 >= start)
            .map(|(&pred_start, _)| pred_start);

        let absorbed: Vec<u64> = predecessor
            .into_iter()
            .chain(self.pending.range(start..=end).map(|(&key, _)| key))
            .collect();

        if absorbed.is_empty() {
            self.pending.insert(start, data);
            return;
        }

        let mut merged_start = start;
        let mut prefix = Bytes::new();
        let mut suffix = Bytes::new();

        for key in absorbed {
            let Some(old) = self.pending.remove(&key) else {
                continue;
            };
            let old_end = key + old.len() as u64;

            if key < start {
                merged_start = key;
                prefix = old.slice(..(start - key) as usize);
            }
            if old_end > end {
                suffix = old.slice((end - key) as usize..);
            }
        }

        if prefix.is_empty() && suffix.is_empty() {
            self.pending.insert(merged_start, data);
            return;
        }

        let mut merged = BytesMut::with_capacity(prefix.len() + data.len() + suffix.len());
        merged.extend_from_slice(&prefix);
        merged.extend_from_slice(&data);
        merged.extend_from_slice(&suffix);
        self.pending.insert(merged_start, merged.freeze());
    }

    /// Push every interval that starts exactly at `next_index`
    fn flush(&mut self) {
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.next_index {
                break;
            }

            let data = entry.remove();
            self.next_index += data.len() as u64;
            self.output.writer().push(data);
        }
    }

    fn close_if_done(&mut self) {
        if self.end_index == Some(self.next_index) && !self.output.is_closed() {
            tracing::debug!(end_index = self.next_index, "stream fully assembled");
            self.output.writer().close();
        }
    }

    /// Number of bytes stored but not yet assembled
    pub fn bytes_pending(&self) -> u64 {
        self.pending.values().map(|data| data.len() as u64).sum()
    }

    /// Index of the next byte the output still needs
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// The assembled output
    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    /// Read side of the assembled output
    pub fn reader(&mut self) -> Reader<'_> {
        self.output.reader()
    }

    /// Write side of the assembled output
    pub fn writer(&mut self) -> Writer<'_> {
        self.output.writer()
    }
}
