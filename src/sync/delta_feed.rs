//! Accumulates stream deltas across delta-query polls.

use std::collections::HashSet;

use crate::models::{DeltaSnapshot, StreamCursor, StreamDelta, StreamMessageMeta};

/// Deltas and cursors for the streams of one thread
#[derive(Debug, Default)]
pub struct DeltaFeed {
    thread_id: Option<String>,
    streams: Vec<StreamMessageMeta>,
    deltas: Vec<StreamDelta>,
}

impl DeltaFeed {
    pub fn new(thread_id: Option<String>) -> Self {
        Self {
            thread_id,
            ..Self::default()
        }
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Forget everything and follow another thread.
    pub fn reset(&mut self, thread_id: Option<String>) {
        self.thread_id = thread_id;
        self.streams.clear();
        self.deltas.clear();
    }

    /// Replace the set of reported streams.
    ///
    /// Deltas of streams no longer reported are dropped.
    pub fn set_streams(&mut self, streams: Vec<StreamMessageMeta>) {
        let live: HashSet<&str> = streams.iter().map(|s| s.stream_id.as_str()).collect();
        let before = self.deltas.len();
        self.deltas.retain(|d| live.contains(d.stream_id.as_str()));
        let dropped = before - self.deltas.len();
        if dropped > 0 {
            tracing::debug!(thread_id = ?self.thread_id, dropped, "Dropped deltas of finished streams");
        }
        self.streams = streams;
    }

    /// Cursor per reported stream: end of the contiguous run starting at zero.
    ///
    /// A gap keeps the cursor before it, so the next poll asks for the
    /// missing chunk again.
    pub fn cursors(&self) -> Vec<StreamCursor> {
        self.streams
            .iter()
            .map(|stream| {
                let mut chunks: Vec<&StreamDelta> = self
                    .deltas
                    .iter()
                    .filter(|d| d.stream_id == stream.stream_id)
                    .collect();
                chunks.sort_by_key(|d| d.start);

                let mut cursor = 0;
                for chunk in chunks {
                    if chunk.start > cursor {
                        break;
                    }
                    cursor = cursor.max(chunk.end);
                }
                StreamCursor {
                    stream_id: stream.stream_id.clone(),
                    cursor,
                }
            })
            .collect()
    }

    /// Add freshly fetched deltas. Returns how many were new.
    ///
    /// Chunks for unreported streams and chunks already held are ignored.
    pub fn ingest(&mut self, deltas: Vec<StreamDelta>) -> usize {
        let mut added = 0;
        for delta in deltas {
            let reported = self.streams.iter().any(|s| s.stream_id == delta.stream_id);
            let duplicate = self
                .deltas
                .iter()
                .any(|d| d.stream_id == delta.stream_id && d.start == delta.start);
            if reported && !duplicate {
                self.deltas.push(delta);
                added += 1;
            }
        }
        if added > 0 {
            tracing::trace!(thread_id = ?self.thread_id, added, "Ingested deltas");
        }
        added
    }

    pub fn snapshot(&self) -> DeltaSnapshot {
        DeltaSnapshot {
            thread_id: self.thread_id.clone(),
            streams: self.streams.clone(),
            deltas: self.deltas.clone(),
        }
    }
}
