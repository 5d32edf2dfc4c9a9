//! Leave-behind presence engine.
//!
//! Turns a stream of position samples into enter/leave transitions against a
//! set of circular places, logs which items were present on entry, reminds
//! about always-take items on departure after a minimum dwell, and ranks
//! likely places for a lost item from the event history.
//!
//! Zero I/O: persistence and reminder delivery are host-supplied traits.

pub mod constants;
pub mod error;
pub mod event;
pub mod geo;
pub mod item;
pub mod place;
pub mod policy;
pub mod recovery;
pub mod serde_compat;
pub mod session;
pub mod time;
pub mod tracker;

pub use constants::{
    DEFAULT_MIN_SESSION_SECS, DEFAULT_PLACE_NAME, DEFAULT_RADIUS_METERS, EARTH_RADIUS_M,
    FREQUENCY_WEIGHT, RECENCY_WEIGHT,
};
pub use error::{CoreError, Result};
pub use event::{EventHistory, HistoryPersistence, ItemEvent, MemoryPersistence, PersistenceError};
pub use geo::{Coordinate, distance_meters};
pub use item::{Item, ItemLedger};
pub use place::{Place, PlaceId, PlaceRegistry};
pub use policy::{DeliveryError, Reminder, ReminderSink, SessionPolicy};
pub use recovery::{HeatPoint, RecoverySuggestion, heat_points, latest_sightings, suggest};
pub use serde_compat::{CURRENT_VERSION, export_json, import_json};
pub use session::{SampleOutcome, TrackingSession};
pub use time::{now_iso8601, now_unix_millis, unix_millis_to_iso8601, whole_minutes_ago};
pub use tracker::{Presence, PresenceSession, PresenceTracker, Transition};
