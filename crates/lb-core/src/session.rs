//! The owned tracking session: registry, ledger, history, tracker and policy
//! behind one start/stop lifecycle.
//!
//! All mutation goes through this type so that history is persisted after
//! each change and reminders are routed to the sink. Persistence and delivery
//! failures are logged and swallowed; they never alter presence state.

use serde::Serialize;

use crate::constants::MILLIS_PER_SECOND;
use crate::error::{CoreError, Result};
use crate::event::{EventHistory, HistoryPersistence, ItemEvent};
use crate::geo::Coordinate;
use crate::item::{Item, ItemLedger};
use crate::place::{Place, PlaceId, PlaceRegistry};
use crate::policy::{Reminder, ReminderSink, SessionPolicy};
use crate::recovery::{self, HeatPoint, RecoverySuggestion};
use crate::tracker::{Presence, PresenceSession, PresenceTracker, Transition};

/// What one sample did.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SampleOutcome {
    pub transition: Option<Transition>,
    /// Events appended to history (non-zero only on `Entered`).
    pub events_logged: usize,
    pub reminder: Option<Reminder>,
}

pub struct TrackingSession<P: HistoryPersistence, S: ReminderSink> {
    places: PlaceRegistry,
    items: ItemLedger,
    history: EventHistory,
    tracker: PresenceTracker,
    policy: SessionPolicy,
    persistence: P,
    sink: S,
    tracking: bool,
}

impl<P: HistoryPersistence, S: ReminderSink> TrackingSession<P, S> {
    /// Create a stopped session, loading history from `persistence`.
    /// A failed load starts from an empty log.
    pub fn new(mut persistence: P, sink: S, policy: SessionPolicy) -> Self {
        let history = match persistence.load() {
            Ok(events) => {
                tracing::info!("loaded {} history events", events.len());
                EventHistory::from_events(events)
            }
            Err(e) => {
                tracing::warn!("failed to load history, starting empty: {e}");
                EventHistory::new()
            }
        };
        Self {
            places: PlaceRegistry::new(),
            items: ItemLedger::new(),
            history,
            tracker: PresenceTracker::new(),
            policy,
            persistence,
            sink,
            tracking: false,
        }
    }

    pub fn with_places(mut self, places: PlaceRegistry) -> Self {
        self.places = places;
        self
    }

    pub fn with_items(mut self, items: ItemLedger) -> Self {
        self.items = items;
        self
    }

    // --- Lifecycle ---

    pub fn start(&mut self) {
        if !self.tracking {
            tracing::info!("tracking started ({} places)", self.places.len());
        }
        self.tracking = true;
    }

    /// Stop tracking. An active session is abandoned without `Left` or reminder.
    pub fn stop(&mut self) -> Option<PresenceSession> {
        self.tracking = false;
        let abandoned = self.tracker.stop();
        match &abandoned {
            Some(session) => {
                tracing::info!("tracking stopped, abandoned session at '{}'", session.place.name)
            }
            None => tracing::info!("tracking stopped"),
        }
        abandoned
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn presence(&self) -> &Presence {
        self.tracker.presence()
    }

    // --- Samples ---

    /// Apply one position sample. Samples delivered while stopped are ignored.
    /// Out-of-range samples return `InvalidSample` and change nothing.
    pub fn on_sample(&mut self, coord: Coordinate, now: i64) -> Result<SampleOutcome> {
        if !self.tracking {
            tracing::debug!("sample ignored, tracking is stopped");
            return Ok(SampleOutcome::default());
        }

        let Some(transition) = self.tracker.on_sample(&self.places, coord, now)? else {
            return Ok(SampleOutcome::default());
        };

        let mut outcome = SampleOutcome::default();
        match &transition {
            Transition::Entered { place, at } => {
                tracing::info!("entered '{}'", place.name);
                let events = self.items.events_at(place, *at);
                outcome.events_logged = events.len();
                if !events.is_empty() {
                    self.history.append_all(events);
                    self.persist_history();
                }
            }
            Transition::Left {
                place,
                elapsed_secs,
            } => {
                tracing::info!("left '{}' after {elapsed_secs}s", place.name);
                outcome.reminder = self.remind(place, *elapsed_secs);
            }
        }
        outcome.transition = Some(transition);
        Ok(outcome)
    }

    /// Deliver a departure reminder as if the user just walked out.
    ///
    /// When outside, pretends the user has been in the first registered place
    /// for just over the minimum dwell. Returns `None` when no place exists.
    pub fn simulate_leaving(&mut self, now: i64) -> Option<Reminder> {
        if !self.tracker.is_inside() {
            let place = self.places.list().first()?.clone();
            let dwell_ms = i64::try_from(self.policy.min_session_secs())
                .unwrap_or(i64::MAX)
                .saturating_add(1)
                .saturating_mul(MILLIS_PER_SECOND);
            self.tracker.force_enter(place, now.saturating_sub(dwell_ms));
        }
        let Some(Transition::Left {
            place,
            elapsed_secs,
        }) = self.tracker.leave(now)
        else {
            return None;
        };
        let reminder = Reminder {
            items: self.items.candidates_always(),
            place,
            elapsed_secs,
        };
        self.deliver(&reminder);
        Some(reminder)
    }

    fn remind(&mut self, place: &Place, elapsed_secs: u64) -> Option<Reminder> {
        let reminder = self.policy.evaluate(place, elapsed_secs, &self.items)?;
        self.deliver(&reminder);
        Some(reminder)
    }

    fn deliver(&mut self, reminder: &Reminder) {
        if let Err(e) = self.sink.deliver(reminder) {
            tracing::warn!("reminder delivery for '{}' failed: {e}", reminder.place.name);
        }
    }

    fn persist_history(&mut self) {
        if let Err(e) = self.persistence.save(self.history.all()) {
            tracing::warn!("failed to persist history: {e}");
        }
    }

    // --- Places ---

    pub fn places(&self) -> &PlaceRegistry {
        &self.places
    }

    pub fn add_place(&mut self, place: Place) -> Result<PlaceId> {
        self.places.add(place)
    }

    pub fn remove_place(&mut self, id: PlaceId) -> Result<Place> {
        self.places
            .remove(id)
            .ok_or_else(|| CoreError::UnknownPlace(id.to_string()))
    }

    pub fn remove_place_at(&mut self, index: usize) -> Result<Place> {
        self.places
            .remove_at(index)
            .ok_or_else(|| CoreError::UnknownPlace(format!("#{index}")))
    }

    pub fn clear_places(&mut self) {
        self.places.clear();
    }

    // --- Items ---

    pub fn items(&self) -> &ItemLedger {
        &self.items
    }

    pub fn add_item(&mut self, name: &str) -> Result<Item> {
        self.items.add(name).cloned()
    }

    pub fn toggle_item(&mut self, name: &str) -> Result<bool> {
        self.items.toggle_always(name)
    }

    pub fn remove_item(&mut self, name: &str) -> Result<Item> {
        self.items.remove(name)
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    // --- History ---

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn append_events(&mut self, events: Vec<ItemEvent>) {
        self.history.append_all(events);
        self.persist_history();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist_history();
    }

    pub fn recover(&self, item_name: &str, now: i64) -> Vec<RecoverySuggestion> {
        recovery::suggest(item_name, self.history.all(), now)
    }

    pub fn latest_sightings(&self) -> Vec<ItemEvent> {
        recovery::latest_sightings(self.history.all())
    }

    pub fn heat_points(&self) -> Vec<HeatPoint> {
        recovery::heat_points(self.history.all())
    }

    // --- Configuration ---

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn set_min_session_secs(&mut self, secs: u64) {
        self.policy.set_min_session_secs(secs);
    }

    // --- Collaborators ---

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
