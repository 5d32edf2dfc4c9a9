use std::path::Path;

use rusqlite::{Connection, params};
use uuid::Uuid;

use lb_core::{
    Coordinate, HistoryPersistence, ItemEvent, ItemLedger, PersistenceError, Place, PlaceId,
    PlaceRegistry,
};

use crate::error::{Result, StoreError};
use crate::schema;

pub struct Store {
    conn: Connection,
    /// Length of the session log prefix this handle has already written.
    /// Other handles may clear or append rows, so the row count is not used.
    synced: usize,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn, synced: 0 })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn, synced: 0 })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Places and items ---

    /// Replace stored places with `places`, keeping registration order.
    pub fn save_places(&self, places: &PlaceRegistry) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM places", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO places (id, position, name, latitude, longitude, radius_meters)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (pos, place) in places.iter().enumerate() {
                stmt.execute(params![
                    place.id.to_string(),
                    pos as i64,
                    place.name,
                    place.center.latitude,
                    place.center.longitude,
                    place.radius_meters,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_places(&self) -> Result<PlaceRegistry> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, latitude, longitude, radius_meters FROM places ORDER BY position",
        )?;
        let rows: Vec<(String, String, f64, f64, f64)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        let mut registry = PlaceRegistry::new();
        for (id_str, name, lat, lng, radius) in rows {
            let id = PlaceId(parse_uuid(&id_str)?);
            let place = Place::with_id(id, &name, Coordinate::new(lat, lng), radius)?;
            registry.add(place)?;
        }
        Ok(registry)
    }

    /// Replace stored items with `items`, keeping insertion order.
    pub fn save_items(&self, items: &ItemLedger) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM items", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO items (name, position, always_take) VALUES (?1, ?2, ?3)")?;
            for (pos, item) in items.list().iter().enumerate() {
                stmt.execute(params![item.name, pos as i64, item.always_take as i32])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_items(&self) -> Result<ItemLedger> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, always_take FROM items ORDER BY position")?;
        let rows: Vec<(String, bool)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i32>(1)? != 0)))?
            .collect::<std::result::Result<_, _>>()?;

        let mut ledger = ItemLedger::new();
        for (name, always_take) in rows {
            ledger.add_with(&name, always_take)?;
        }
        Ok(ledger)
    }

    pub fn save_catalog(&self, places: &PlaceRegistry, items: &ItemLedger) -> Result<()> {
        self.save_places(places)?;
        self.save_items(items)
    }

    // --- Event history ---

    pub fn load_events(&self) -> Result<Vec<ItemEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_name, place_name, latitude, longitude, timestamp
             FROM item_events ORDER BY id",
        )?;
        let events = stmt
            .query_map([], event_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(events)
    }

    pub fn events_for_item(&self, item_name: &str) -> Result<Vec<ItemEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_name, place_name, latitude, longitude, timestamp
             FROM item_events WHERE item_name = ?1 ORDER BY id",
        )?;
        let events = stmt
            .query_map([item_name], event_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(events)
    }

    pub fn event_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM item_events", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn append_events(&self, events: &[ItemEvent]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_events(&tx, events)?;
        tx.commit()?;
        Ok(())
    }

    pub fn replace_events(&self, events: &[ItemEvent]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM item_events", [])?;
        insert_events(&tx, events)?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear_events(&self) -> Result<()> {
        self.conn.execute("DELETE FROM item_events", [])?;
        Ok(())
    }

    /// Write the part of the session log this handle has not written yet.
    /// A log shorter than what was written means it was cleared, and the
    /// table is rewritten from it.
    pub fn sync_events(&mut self, events: &[ItemEvent]) -> Result<()> {
        if events.len() < self.synced {
            tracing::debug!(
                "history shrank from {} to {}, rewriting",
                self.synced,
                events.len()
            );
            self.replace_events(events)?;
        } else {
            self.append_events(&events[self.synced..])?;
        }
        self.synced = events.len();
        Ok(())
    }
}

impl HistoryPersistence for Store {
    fn load(&mut self) -> std::result::Result<Vec<ItemEvent>, PersistenceError> {
        let events = self.load_events()?;
        self.synced = events.len();
        Ok(events)
    }

    fn save(&mut self, events: &[ItemEvent]) -> std::result::Result<(), PersistenceError> {
        Ok(self.sync_events(events)?)
    }
}

fn insert_events(conn: &Connection, events: &[ItemEvent]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO item_events (item_name, place_name, latitude, longitude, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for e in events {
        stmt.execute(params![
            e.item_name,
            e.place_name,
            e.coordinate.latitude,
            e.coordinate.longitude,
            e.timestamp,
        ])?;
    }
    Ok(())
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemEvent> {
    Ok(ItemEvent {
        item_name: row.get(0)?,
        place_name: row.get(1)?,
        coordinate: Coordinate::new(row.get(2)?, row.get(3)?),
        timestamp: row.get(4)?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}
