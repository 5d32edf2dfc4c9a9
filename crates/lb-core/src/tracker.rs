//! Presence state machine: position samples in, enter/leave transitions out.
//!
//! The tracker holds at most one session. While inside a place it only reacts
//! to loss of containment, so walking from one place straight into an
//! overlapping one is not observed until the first place is left. There is no
//! timer; a user who stops moving never produces a `Left`.

use serde::Serialize;

use crate::constants::MILLIS_PER_SECOND;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::place::{Place, PlaceRegistry};

/// "Inside `place` since `entered_at`" (Unix ms).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PresenceSession {
    pub place: Place,
    pub entered_at: i64,
}

impl PresenceSession {
    /// Whole seconds since entry, never negative.
    pub fn dwell_secs(&self, now: i64) -> u64 {
        (now.saturating_sub(self.entered_at).max(0) / MILLIS_PER_SECOND) as u64
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Entered { place: Place, at: i64 },
    Left { place: Place, elapsed_secs: u64 },
}

impl Transition {
    pub fn place(&self) -> &Place {
        match self {
            Transition::Entered { place, .. } | Transition::Left { place, .. } => place,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "session", rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Outside,
    Inside(PresenceSession),
}

#[derive(Clone, Debug, Default)]
pub struct PresenceTracker {
    presence: Presence,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn is_inside(&self) -> bool {
        matches!(self.presence, Presence::Inside(_))
    }

    pub fn current_place(&self) -> Option<&Place> {
        match &self.presence {
            Presence::Inside(session) => Some(&session.place),
            Presence::Outside => None,
        }
    }

    /// Feed one sample captured at `now`. Out-of-range samples are rejected
    /// before any state is touched.
    pub fn on_sample(
        &mut self,
        places: &PlaceRegistry,
        coord: Coordinate,
        now: i64,
    ) -> Result<Option<Transition>> {
        let coord = coord.validate()?;
        let found = places.first_containing(coord);

        let transition = match (self.is_inside(), found) {
            (false, Some(place)) => {
                let place = place.clone();
                self.presence = Presence::Inside(PresenceSession {
                    place: place.clone(),
                    entered_at: now,
                });
                Some(Transition::Entered { place, at: now })
            }
            (true, None) => self.leave(now),
            _ => None,
        };

        Ok(transition)
    }

    /// Start a session directly, bypassing containment. Ignored while inside.
    pub fn force_enter(&mut self, place: Place, entered_at: i64) -> bool {
        if self.is_inside() {
            return false;
        }
        self.presence = Presence::Inside(PresenceSession { place, entered_at });
        true
    }

    /// End the current session as a natural exit.
    pub fn leave(&mut self, now: i64) -> Option<Transition> {
        match std::mem::take(&mut self.presence) {
            Presence::Inside(session) => {
                let elapsed_secs = session.dwell_secs(now);
                Some(Transition::Left {
                    place: session.place,
                    elapsed_secs,
                })
            }
            Presence::Outside => None,
        }
    }

    /// Abandon the current session without a `Left` transition.
    pub fn stop(&mut self) -> Option<PresenceSession> {
        match std::mem::take(&mut self.presence) {
            Presence::Inside(session) => Some(session),
            Presence::Outside => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    const OFFICE: Coordinate = Coordinate {
        latitude: 37.0,
        longitude: -122.0,
    };
    const AWAY: Coordinate = Coordinate {
        latitude: 37.01,
        longitude: -122.0,
    };

    fn registry() -> PlaceRegistry {
        let mut r = PlaceRegistry::new();
        r.add(Place::new("Office", OFFICE, 50.0).unwrap()).unwrap();
        r
    }

    #[test]
    fn test_enter_then_leave() {
        let places = registry();
        let mut t = PresenceTracker::new();

        let entered = t.on_sample(&places, OFFICE, 1_000).unwrap().unwrap();
        assert!(matches!(&entered, Transition::Entered { place, at: 1_000 } if place.name == "Office"));
        assert!(t.is_inside());

        let left = t.on_sample(&places, AWAY, 41_000).unwrap().unwrap();
        assert_eq!(
            left,
            Transition::Left {
                place: places.list()[0].clone(),
                elapsed_secs: 40
            }
        );
        assert!(!t.is_inside());
    }

    #[test]
    fn test_never_inside_never_enters() {
        let places = registry();
        let mut t = PresenceTracker::new();
        for i in 0..20 {
            let c = Coordinate::new(36.0 + i as f64 * 0.01, -121.0);
            assert_eq!(t.on_sample(&places, c, i * 1_000).unwrap(), None);
        }
        assert_eq!(t.presence(), &Presence::Outside);
    }

    #[test]
    fn test_staying_inside_emits_nothing() {
        let places = registry();
        let mut t = PresenceTracker::new();
        t.on_sample(&places, OFFICE, 0).unwrap();
        let nearby = Coordinate::new(37.0001, -122.0);
        assert_eq!(t.on_sample(&places, nearby, 5_000).unwrap(), None);
        assert_eq!(t.on_sample(&places, OFFICE, 10_000).unwrap(), None);
    }

    #[test]
    fn test_no_switch_while_inside_overlapping_place() {
        let mut places = registry();
        let park = Coordinate::new(37.0003, -122.0);
        places.add(Place::new("Park", park, 100.0).unwrap()).unwrap();
        let mut t = PresenceTracker::new();

        t.on_sample(&places, OFFICE, 0).unwrap();
        // Now only inside Park, but the Office session is kept
        let only_park = Coordinate::new(37.0008, -122.0);
        assert!(!places.list()[0].contains(only_park));
        assert!(places.list()[1].contains(only_park));
        assert_eq!(t.on_sample(&places, only_park, 1_000).unwrap(), None);
        assert_eq!(t.current_place().unwrap().name, "Office");
    }

    #[test]
    fn test_invalid_sample_leaves_state_untouched() {
        let places = registry();
        let mut t = PresenceTracker::new();
        t.on_sample(&places, OFFICE, 0).unwrap();

        let err = t
            .on_sample(&places, Coordinate::new(120.0, 0.0), 60_000)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSample { .. }));
        assert!(t.is_inside());
    }

    #[test]
    fn test_stop_is_silent() {
        let places = registry();
        let mut t = PresenceTracker::new();
        t.on_sample(&places, OFFICE, 0).unwrap();

        let abandoned = t.stop().unwrap();
        assert_eq!(abandoned.place.name, "Office");
        assert!(!t.is_inside());
        // Leaving after stop produces nothing
        assert_eq!(t.on_sample(&places, AWAY, 90_000).unwrap(), None);
        assert!(t.stop().is_none());
    }

    #[test]
    fn test_clock_skew_saturates_to_zero() {
        let places = registry();
        let mut t = PresenceTracker::new();
        t.on_sample(&places, OFFICE, 10_000).unwrap();
        let left = t.on_sample(&places, AWAY, 5_000).unwrap().unwrap();
        assert!(matches!(left, Transition::Left { elapsed_secs: 0, .. }));
    }

    #[test]
    fn test_dwell_saturates_at_extremes() {
        let session = PresenceSession {
            place: Place::new("Office", Coordinate::new(0.0, 0.0), 10.0).unwrap(),
            entered_at: i64::MIN,
        };
        assert_eq!(session.dwell_secs(i64::MAX), (i64::MAX / MILLIS_PER_SECOND) as u64);
    }

    #[test]
    fn test_dwell_floors_partial_seconds() {
        let session = PresenceSession {
            place: registry().list()[0].clone(),
            entered_at: 0,
        };
        assert_eq!(session.dwell_secs(29_999), 29);
        assert_eq!(session.dwell_secs(30_000), 30);
    }

    #[test]
    fn test_force_enter() {
        let places = registry();
        let mut t = PresenceTracker::new();
        assert!(t.force_enter(places.list()[0].clone(), 0));
        assert!(!t.force_enter(places.list()[0].clone(), 5));
        assert!(matches!(t.leave(31_000), Some(Transition::Left { elapsed_secs: 31, .. })));
        assert!(t.leave(40_000).is_none());
    }
}
