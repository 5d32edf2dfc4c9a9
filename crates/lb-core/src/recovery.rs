//! "Where did I leave X?" ranking over the event history.
//!
//! Each event for the item scores `0.6 * recency + 0.4 * frequency`, where
//! recency is `1 / max(1, minutes ago)` and frequency is how many of the
//! item's events share that event's place. A place keeps its best-scoring
//! event. Frequency is recounted for every event rather than once per place;
//! the result is the same number for all events of one place.

use serde::Serialize;

use crate::constants::{FREQUENCY_WEIGHT, RECENCY_WEIGHT};
use crate::event::ItemEvent;
use crate::geo::Coordinate;
use crate::time::minutes_between;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecoverySuggestion {
    pub place_name: String,
    pub score: f64,
    /// Timestamp of the event that produced `score` (Unix ms).
    pub last_seen: i64,
}

/// A weighted point for density rendering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeatPoint {
    pub coordinate: Coordinate,
    pub weight: f64,
}

/// `1 / max(1, minutes since ts)`. Events at or after `now` score 1.
pub fn recency(now: i64, ts: i64) -> f64 {
    1.0 / minutes_between(now, ts).max(1.0)
}

/// Rank candidate places for `item_name`, best first. Ties keep the order in
/// which places were first encountered in `history`.
pub fn suggest(item_name: &str, history: &[ItemEvent], now: i64) -> Vec<RecoverySuggestion> {
    let matching: Vec<&ItemEvent> = history.iter().filter(|e| e.item_name == item_name).collect();

    let mut candidates: Vec<RecoverySuggestion> = Vec::new();
    for event in &matching {
        let freq = matching
            .iter()
            .filter(|e| e.place_name == event.place_name)
            .count() as f64;
        let score = RECENCY_WEIGHT * recency(now, event.timestamp) + FREQUENCY_WEIGHT * freq;

        match candidates.iter_mut().find(|c| c.place_name == event.place_name) {
            Some(existing) => {
                if score > existing.score {
                    existing.score = score;
                    existing.last_seen = event.timestamp;
                }
            }
            None => candidates.push(RecoverySuggestion {
                place_name: event.place_name.clone(),
                score,
                last_seen: event.timestamp,
            }),
        }
    }

    // sort_by is stable, so equal scores stay in encounter order
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Most recent event per item, items in first-encounter order.
pub fn latest_sightings(history: &[ItemEvent]) -> Vec<ItemEvent> {
    let mut latest: Vec<ItemEvent> = Vec::new();
    for event in history {
        match latest.iter_mut().find(|e| e.item_name == event.item_name) {
            Some(existing) => {
                if event.timestamp > existing.timestamp {
                    *existing = event.clone();
                }
            }
            None => latest.push(event.clone()),
        }
    }
    latest
}

/// Every event location with unit weight.
pub fn heat_points(history: &[ItemEvent]) -> Vec<HeatPoint> {
    history
        .iter()
        .map(|e| HeatPoint {
            coordinate: e.coordinate,
            weight: 1.0,
        })
        .collect()
}
