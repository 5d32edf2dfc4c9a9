use std::path::PathBuf;
use std::sync::Arc;

use lb_core::{
    Coordinate, CoreError, Place, PlaceId, Presence, Reminder, TrackingSession, now_unix_millis,
    whole_minutes_ago,
};
use lb_store::{Config, Profile, Store};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct LbServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    session: TrackingSession<Store, Vec<Reminder>>,
    config: Config,
    config_path: Option<PathBuf>,
}

impl ServerState {
    fn save_catalog(&self) {
        let session = &self.session;
        if let Err(e) = session
            .persistence()
            .save_catalog(session.places(), session.items())
        {
            tracing::warn!("failed to persist places and items: {e}");
        }
    }
}

impl LbServer {
    pub fn new(profile: Profile) -> std::result::Result<Self, String> {
        let config = profile.config().clone();
        let config_path = profile.config_path().map(PathBuf::from);
        let session = profile
            .into_session(Vec::new())
            .map_err(|e| format!("failed to load profile: {e}"))?;
        Ok(Self {
            state: Arc::new(Mutex::new(ServerState {
                session,
                config,
                config_path,
            })),
            tool_router: Self::tool_router(),
        })
    }
}

fn ok_json(value: &serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )]))
}

fn invalid(e: CoreError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn presence_json(presence: &Presence, now: i64) -> serde_json::Value {
    match presence {
        Presence::Outside => serde_json::json!({ "state": "outside" }),
        Presence::Inside(s) => serde_json::json!({
            "state": "inside",
            "place": s.place.name,
            "place_id": s.place.id.to_string(),
            "dwell_secs": s.dwell_secs(now),
        }),
    }
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct AddPlaceRequest {
    /// Display name; blank becomes "Place"
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    /// Radius in meters; defaults to the configured radius
    radius_meters: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RemovePlaceRequest {
    /// Place id as returned by lb_add_place or lb_list_places
    id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ItemRequest {
    /// Item name
    name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SampleRequest {
    latitude: f64,
    longitude: f64,
    /// Unix milliseconds; defaults to now
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RecoverRequest {
    /// Item to look for
    item: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MinSessionRequest {
    /// Minimum dwell in seconds before a reminder fires
    secs: u64,
}

#[tool_router]
impl LbServer {
    #[tool(description = "Register a circular place. Returns the new place with its id.")]
    async fn lb_add_place(
        &self,
        Parameters(req): Parameters<AddPlaceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let radius = req
            .radius_meters
            .unwrap_or(state.config.default_radius_meters);
        let place = Place::new(
            req.name.as_deref().unwrap_or_default(),
            Coordinate::new(req.latitude, req.longitude),
            radius,
        )
        .map_err(invalid)?;
        let json = serde_json::to_value(&place).unwrap_or_default();
        state.session.add_place(place).map_err(invalid)?;
        state.save_catalog();
        ok_json(&json)
    }

    #[tool(description = "List registered places in registration order.")]
    async fn lb_list_places(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        ok_json(&serde_json::to_value(state.session.places().list()).unwrap_or_default())
    }

    #[tool(
        description = "Remove a place by id. An active visit to it still ends normally on the next sample."
    )]
    async fn lb_remove_place(
        &self,
        Parameters(req): Parameters<RemovePlaceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = PlaceId::parse(&req.id).ok_or_else(|| {
            McpError::invalid_params(format!("invalid place id: {}", req.id), None)
        })?;
        let mut state = self.state.lock().await;
        let removed = state.session.remove_place(id).map_err(invalid)?;
        state.save_catalog();
        ok_json(&serde_json::json!({ "removed": removed.name }))
    }

    #[tool(description = "Add an item to carry. New items are always taken.")]
    async fn lb_add_item(
        &self,
        Parameters(req): Parameters<ItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let item = state.session.add_item(&req.name).map_err(invalid)?;
        state.save_catalog();
        ok_json(&serde_json::to_value(&item).unwrap_or_default())
    }

    #[tool(description = "Flip whether an item is always taken. Returns the new flag.")]
    async fn lb_toggle_item(
        &self,
        Parameters(req): Parameters<ItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let always_take = state.session.toggle_item(&req.name).map_err(invalid)?;
        state.save_catalog();
        ok_json(&serde_json::json!({ "name": req.name.trim(), "always_take": always_take }))
    }

    #[tool(description = "Remove an item. Its history is kept.")]
    async fn lb_remove_item(
        &self,
        Parameters(req): Parameters<ItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let item = state.session.remove_item(&req.name).map_err(invalid)?;
        state.save_catalog();
        ok_json(&serde_json::json!({ "removed": item.name }))
    }

    #[tool(description = "List items with their always-take flags.")]
    async fn lb_list_items(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        ok_json(&serde_json::to_value(state.session.items().list()).unwrap_or_default())
    }

    #[tool(description = "Start tracking. Samples sent while stopped are ignored.")]
    async fn lb_start(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.session.start();
        ok_json(&serde_json::json!({ "tracking": true }))
    }

    #[tool(
        description = "Stop tracking. An active visit is abandoned without a departure reminder."
    )]
    async fn lb_stop(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let abandoned = state.session.stop();
        ok_json(&serde_json::json!({
            "tracking": false,
            "abandoned": abandoned.map(|s| s.place.name),
        }))
    }

    #[tool(
        description = "Feed one position sample. Returns the transition (entered/left), the number of item events logged, and any departure reminder with its notification text."
    )]
    async fn lb_sample(
        &self,
        Parameters(req): Parameters<SampleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let now = req.timestamp.unwrap_or_else(now_unix_millis);
        let outcome = state
            .session
            .on_sample(Coordinate::new(req.latitude, req.longitude), now)
            .map_err(invalid)?;
        // Reminders travel in the response; the sink only buffers them.
        state.session.sink_mut().clear();

        let mut json = serde_json::to_value(&outcome).unwrap_or_default();
        if let Some(r) = &outcome.reminder {
            json["notification"] = serde_json::json!({
                "title": r.title(),
                "subtitle": r.subtitle(),
                "body": r.body(),
            });
        }
        ok_json(&json)
    }

    #[tool(
        description = "Rank places where an item was most likely left, best first, scored from recency and frequency of sightings."
    )]
    async fn lb_recover(
        &self,
        Parameters(req): Parameters<RecoverRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let now = now_unix_millis();
        let ranked: Vec<serde_json::Value> = state
            .session
            .recover(req.item.trim(), now)
            .iter()
            .map(|s| {
                serde_json::json!({
                    "place_name": s.place_name,
                    "score": s.score,
                    "last_seen": s.last_seen,
                    "minutes_ago": whole_minutes_ago(now, s.last_seen),
                })
            })
            .collect();
        ok_json(&serde_json::json!({ "item": req.item.trim(), "suggestions": ranked }))
    }

    #[tool(description = "Tracking state, current presence, and catalog sizes.")]
    async fn lb_status(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let session = &state.session;
        let now = now_unix_millis();
        ok_json(&serde_json::json!({
            "tracking": session.is_tracking(),
            "presence": presence_json(session.presence(), now),
            "places": session.places().len(),
            "items": session.items().len(),
            "events": session.history().len(),
            "min_session_secs": session.policy().min_session_secs(),
        }))
    }

    #[tool(
        description = "Set the minimum dwell in seconds before leaving a place triggers a reminder. Applies to the next departure."
    )]
    async fn lb_set_min_session(
        &self,
        Parameters(req): Parameters<MinSessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        state.session.set_min_session_secs(req.secs);
        state.config.min_session_secs = req.secs;
        if let Some(path) = &state.config_path
            && let Err(e) = state.config.save(path)
        {
            tracing::warn!("failed to persist config: {e}");
        }
        ok_json(&serde_json::json!({ "min_session_secs": req.secs }))
    }
}

#[tool_handler]
impl ServerHandler for LbServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Leave-behind tracker: reminds the user about items when they leave a place, \
                 and helps find lost items.\n\n\
                 SETUP: register places with lb_add_place and items with lb_add_item. \
                 Items are always taken unless toggled with lb_toggle_item.\n\
                 TRACKING: call lb_start, then send position fixes with lb_sample. \
                 A sample response includes a notification when a departure reminder fires. \
                 Call lb_stop to end tracking.\n\
                 RECOVERY: when the user has lost an item, call lb_recover and suggest places \
                 in the returned order."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
