use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::event::ItemEvent;
use crate::place::Place;

/// Something the user carries. `always_take` items are named in reminders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub always_take: bool,
}

/// Tracked items keyed by name, kept in insertion order.
///
/// Every item is logged to history when a place is entered; only the
/// `always_take` subset is offered in departure reminders.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ItemLedger {
    items: Vec<Item>,
}

impl ItemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new item. New items are always-take by default.
    pub fn add(&mut self, name: &str) -> Result<&Item> {
        self.add_with(name, true)
    }

    pub fn add_with(&mut self, name: &str, always_take: bool) -> Result<&Item> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidItem("name must not be blank".to_string()));
        }
        if self.get(name).is_some() {
            return Err(CoreError::DuplicateItem(name.to_string()));
        }
        self.items.push(Item {
            name: name.to_string(),
            always_take,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// Flip the always-take flag. Returns the new value.
    pub fn toggle_always(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        let item = self
            .items
            .iter_mut()
            .find(|it| it.name == name)
            .ok_or_else(|| CoreError::UnknownItem(name.to_string()))?;
        item.always_take = !item.always_take;
        Ok(item.always_take)
    }

    pub fn remove(&mut self, name: &str) -> Result<Item> {
        let name = name.trim();
        let idx = self
            .items
            .iter()
            .position(|it| it.name == name)
            .ok_or_else(|| CoreError::UnknownItem(name.to_string()))?;
        Ok(self.items.remove(idx))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Look up by name, ignoring surrounding whitespace.
    pub fn get(&self, name: &str) -> Option<&Item> {
        let name = name.trim();
        self.items.iter().find(|it| it.name == name)
    }

    pub fn list(&self) -> &[Item] {
        &self.items
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|it| it.name.clone()).collect()
    }

    /// Names of always-take items, in insertion order. This is the reminder list.
    pub fn candidates_always(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|it| it.always_take)
            .map(|it| it.name.clone())
            .collect()
    }

    /// One event per tracked item, stamped at the place's center.
    pub fn events_at(&self, place: &Place, timestamp: i64) -> Vec<ItemEvent> {
        self.items
            .iter()
            .map(|it| ItemEvent::at_place(&it.name, place, timestamp))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
