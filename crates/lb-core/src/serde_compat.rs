//! JSON serde for the history wire format.
//!
//! Exports use camelCase field names:
//! `{ "version", "exportedAt", "events": [{ "itemName", "placeName",
//! "coordinate": { "latitude", "longitude" }, "timestamp" }] }`.
//! Imports also accept a bare event array and the legacy flat event shape
//! `{ "name", "place", "lat", "lng", "timestamp" }`.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::event::ItemEvent;
use crate::geo::Coordinate;
use crate::time::now_iso8601;

pub const CURRENT_VERSION: &str = "1";

// --- Wire format types ---

#[derive(Serialize, Deserialize, Debug)]
pub struct WireExport {
    pub version: String,
    #[serde(rename = "exportedAt", default)]
    pub exported_at: String,
    pub events: Vec<WireEvent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct WireCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireEvent {
    #[serde(rename = "itemName", alias = "name")]
    pub item_name: String,
    #[serde(rename = "placeName", alias = "place")]
    pub place_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<WireCoordinate>,
    /// Legacy flat latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Legacy flat longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub timestamp: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDocument {
    Export(WireExport),
    Bare(Vec<WireEvent>),
}

// --- Conversions ---

impl From<&ItemEvent> for WireEvent {
    fn from(e: &ItemEvent) -> Self {
        Self {
            item_name: e.item_name.clone(),
            place_name: e.place_name.clone(),
            coordinate: Some(WireCoordinate {
                latitude: e.coordinate.latitude,
                longitude: e.coordinate.longitude,
            }),
            lat: None,
            lng: None,
            timestamp: e.timestamp,
        }
    }
}

impl WireEvent {
    fn into_event(self) -> Result<ItemEvent, String> {
        let coordinate = match (self.coordinate, self.lat, self.lng) {
            (Some(c), _, _) => Coordinate::new(c.latitude, c.longitude),
            (None, Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => {
                return Err(format!(
                    "event for '{}' at '{}' has no coordinate",
                    self.item_name, self.place_name
                ));
            }
        };
        Ok(ItemEvent {
            item_name: self.item_name,
            place_name: self.place_name,
            coordinate,
            timestamp: self.timestamp,
        })
    }
}

/// Serialize a history to the current wire format.
pub fn export_json(events: &[ItemEvent]) -> serde_json::Result<String> {
    let wire = WireExport {
        version: CURRENT_VERSION.to_string(),
        exported_at: now_iso8601(),
        events: events.iter().map(WireEvent::from).collect(),
    };
    serde_json::to_string_pretty(&wire)
}

/// Parse a history export, a bare event array, or legacy flat events.
/// Event order is preserved.
pub fn import_json(json: &str) -> serde_json::Result<Vec<ItemEvent>> {
    let doc: WireDocument = serde_json::from_str(json)?;
    let wire_events = match doc {
        WireDocument::Export(export) => export.events,
        WireDocument::Bare(events) => events,
    };
    wire_events
        .into_iter()
        .map(|w| w.into_event().map_err(serde_json::Error::custom))
        .collect()
}
