use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_PLACE_NAME;
use crate::error::{CoreError, Result};
use crate::geo::Coordinate;

/// Stable place identifier. Survives removal of other places, unlike a list index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub Uuid);

impl PlaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for PlaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named circular region. Names are display keys and need not be unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl Place {
    /// Build a place with a fresh id. Blank names fall back to "Place".
    pub fn new(name: &str, center: Coordinate, radius_meters: f64) -> Result<Self> {
        Self::with_id(PlaceId::new(), name, center, radius_meters)
    }

    pub fn with_id(id: PlaceId, name: &str, center: Coordinate, radius_meters: f64) -> Result<Self> {
        let name = name.trim();
        let place = Self {
            id,
            name: if name.is_empty() {
                DEFAULT_PLACE_NAME.to_string()
            } else {
                name.to_string()
            },
            center,
            radius_meters,
        };
        place.check()?;
        Ok(place)
    }

    fn check(&self) -> Result<()> {
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(CoreError::InvalidPlace(format!(
                "radius must be positive, got {}",
                self.radius_meters
            )));
        }
        if !self.center.is_valid() {
            return Err(CoreError::InvalidPlace(format!(
                "center ({}, {}) is out of range",
                self.center.latitude, self.center.longitude
            )));
        }
        Ok(())
    }

    pub fn distance_from_center(&self, coord: Coordinate) -> f64 {
        coord.distance_to(self.center)
    }

    /// Containment is inclusive: a sample exactly on the boundary is inside.
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.distance_from_center(coord) <= self.radius_meters
    }
}

/// Places in registration order. Order decides which of several overlapping
/// places a sample matches.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlaceRegistry {
    places: Vec<Place>,
}

impl PlaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a place. Rejected places leave the registry unchanged.
    pub fn add(&mut self, place: Place) -> Result<PlaceId> {
        place.check()?;
        let id = place.id;
        self.places.push(place);
        Ok(id)
    }

    pub fn remove(&mut self, id: PlaceId) -> Option<Place> {
        let idx = self.places.iter().position(|p| p.id == id)?;
        Some(self.places.remove(idx))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Place> {
        if index < self.places.len() {
            Some(self.places.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.places.clear();
    }

    pub fn list(&self) -> &[Place] {
        &self.places
    }

    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// First place, in registration order, whose region contains `coord`.
    pub fn first_containing(&self, coord: Coordinate) -> Option<&Place> {
        self.places.iter().find(|p| p.contains(coord))
    }
}
