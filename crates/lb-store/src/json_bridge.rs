use std::fs;
use std::path::Path;

use lb_core::{EventHistory, ItemEvent, export_json, import_json};

use crate::error::{Result, StoreError};
use crate::store::Store;

impl Store {
    /// Replace the stored history with the events in a JSON export file.
    /// Returns the number of events imported.
    pub fn import_json_file(&self, path: &Path) -> Result<usize> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(&json)
    }

    /// Replace the stored history with the events in a JSON string.
    /// Timestamps older than their predecessor are raised to it.
    pub fn import_json_str(&self, json: &str) -> Result<usize> {
        let events = EventHistory::from_events(parse_history(json)?).into_events();
        self.replace_events(&events)?;
        Ok(events.len())
    }

    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json_string()?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })
    }

    pub fn export_json_string(&self) -> Result<String> {
        let events = self.load_events()?;
        export_json(&events).map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}

fn parse_history(json: &str) -> Result<Vec<ItemEvent>> {
    import_json(json).map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))
}
