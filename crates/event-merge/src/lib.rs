//! Event Merge
//!
//! K-way merge of streams that are each already in chronological order.
//! The output is fully determined by the input: on equal keys the stream
//! listed first wins.

use alert_model::Event;
use std::iter::Peekable;
use std::vec::IntoIter;

/// Merge pre-sorted streams into one sequence ordered by `key`.
///
/// Every round scans the live streams in input order and takes the head
/// whose key is strictly smallest, so the earliest-listed stream wins ties.
/// Streams are dropped once drained.
pub fn merge_sorted_by_key<T, K, F>(streams: Vec<Vec<T>>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let total = streams.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);

    let mut live: Vec<Peekable<IntoIter<T>>> = streams
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.into_iter().peekable())
        .collect();

    while !live.is_empty() {
        let mut min = 0;
        let mut min_key = None;
        for (i, stream) in live.iter_mut().enumerate() {
            if let Some(head) = stream.peek() {
                let k = key(head);
                if min_key.as_ref().map_or(true, |m| k < *m) {
                    min = i;
                    min_key = Some(k);
                }
            }
        }

        if let Some(item) = live[min].next() {
            out.push(item);
        }
        if live[min].peek().is_none() {
            live.remove(min);
        }
    }

    out
}

/// Merge per-source event logs into report order
pub fn merge_events(streams: Vec<Vec<Event>>) -> Vec<Event> {
    merge_sorted_by_key(streams, Event::timestamp)
}
