//! Stream reconciliation.
//!
//! Deltas arrive as one flat list covering every stream of a thread. This
//! module groups them by stream, folds each group in cursor order onto the
//! state derived on the previous pass, and ties the result to the message
//! order that owns the stream.

use std::collections::HashMap;

use crate::models::{DeltaPart, StreamDelta, StreamMessageMeta, StreamState};

/// Derive per-order streaming state from stream metadata and raw deltas.
///
/// `prior` is the output of the previous call; it lets a long stream be
/// extended without refolding every chunk. Deltas already covered by a prior
/// cursor are skipped, chunks are applied strictly in `start` order and
/// folding stops at the first gap, so a chunk that arrives early is picked up
/// on a later pass once its predecessor shows up.
///
/// Streams missing from `metas` are dropped along with their deltas. The
/// result is sorted by order and depends on nothing but the arguments.
pub fn derive_streaming_messages(
    thread_id: &str,
    metas: &[StreamMessageMeta],
    prior: &[StreamState],
    deltas: &[StreamDelta],
) -> Vec<StreamState> {
    let mut by_stream: HashMap<&str, Vec<&StreamDelta>> = HashMap::new();
    for delta in deltas {
        by_stream
            .entry(delta.stream_id.as_str())
            .or_default()
            .push(delta);
    }

    let mut states: Vec<StreamState> = metas
        .iter()
        .map(|meta| {
            let mut state = prior
                .iter()
                .find(|p| p.stream_id == meta.stream_id)
                .cloned()
                .unwrap_or_else(|| StreamState::empty(meta));
            state.order = meta.order;
            state.status = meta.status;

            if let Some(chunks) = by_stream.get_mut(meta.stream_id.as_str()) {
                chunks.sort_by_key(|d| (d.start, d.end));
                fold_chunks(&mut state, chunks);
            }
            state
        })
        .collect();

    let dropped = by_stream
        .keys()
        .filter(|id| !metas.iter().any(|m| m.stream_id == **id))
        .count();
    if dropped > 0 {
        tracing::debug!(
            thread_id = %thread_id,
            dropped,
            "Ignoring deltas for streams no longer reported"
        );
    }

    states.sort_by_key(|s| s.order);
    states
}

fn fold_chunks(state: &mut StreamState, chunks: &[&StreamDelta]) {
    for chunk in chunks {
        if chunk.end <= state.cursor {
            continue;
        }
        if chunk.start != state.cursor {
            // Gap or overlap; wait for the missing chunk.
            break;
        }
        for part in &chunk.parts {
            match part {
                DeltaPart::TextDelta { text } => state.text.push_str(text),
                DeltaPart::ReasoningDelta { text } => state.reasoning.push_str(text),
                DeltaPart::Other => {}
            }
        }
        state.cursor = chunk.end;
    }
}
