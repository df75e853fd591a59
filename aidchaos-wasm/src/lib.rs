//! WASM bindings for aidchaos — lets a JavaScript scenario host run the
//! input, context and output hooks.
//!
//! The host ships its story cards, history, memory and the session state
//! as JSON with each call and gets the rewritten cards and state back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use aidchaos::core::catalog::AttributeCatalog;
use aidchaos::core::exchange::SessionState;
use aidchaos::core::pipeline::{HookOutput, HostEnv, Orchestrator};
use aidchaos::core::store::MemoryRecordStore;
use aidchaos::schema::history::HistoryEntry;
use aidchaos::schema::record::{RecordId, StoryRecord};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoryCard {
    #[serde(rename = "type", default)]
    card_type: String,
    title: String,
    #[serde(default)]
    keys: String,
    #[serde(default)]
    entry: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HookRequest {
    hook: String,
    text: String,
    #[serde(default)]
    stop: bool,
    #[serde(default)]
    story_cards: Vec<StoryCard>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    memory: String,
    #[serde(default)]
    state: SessionState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HookResponse {
    text: String,
    stop: bool,
    story_cards: Vec<StoryCard>,
    state: SessionState,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn card_to_record(index: usize, card: StoryCard) -> StoryRecord {
    StoryRecord {
        id: RecordId(index as u64),
        record_type: card.card_type,
        title: card.title,
        keys: card.keys,
        body: card.entry,
        description: card.description,
        updated_at: card.updated_at.unwrap_or_else(Utc::now),
    }
}

fn record_to_card(record: StoryRecord) -> StoryCard {
    StoryCard {
        card_type: record.record_type,
        title: record.title,
        keys: record.keys,
        entry: record.body,
        description: record.description,
        updated_at: Some(record.updated_at),
    }
}

// ---------------------------------------------------------------------------
// Exported handle
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct AidChaos {
    orchestrator: Orchestrator,
}

#[wasm_bindgen]
impl AidChaos {
    /// Create a resolver with the built-in attributes. Without a seed the
    /// dice draw from browser entropy.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Result<AidChaos, JsError> {
        Self::build(None, seed)
    }

    /// Create a resolver whose attributes come from a RON catalog merged
    /// over the built-in ones.
    pub fn with_catalog(catalog_ron: &str, seed: Option<u64>) -> Result<AidChaos, JsError> {
        let extra = AttributeCatalog::parse_ron(catalog_ron)
            .map_err(|e| JsError::new(&format!("Catalog parse error: {e}")))?;
        let mut catalog = AttributeCatalog::default();
        catalog.merge(extra);
        Self::build(Some(catalog), seed)
    }

    /// Run one hook. Takes and returns JSON; see `HookRequest`/`HookResponse`.
    pub fn hook(&mut self, request_json: &str) -> Result<String, JsError> {
        let request: HookRequest = serde_json::from_str(request_json)
            .map_err(|e| JsError::new(&format!("Invalid request: {e}")))?;

        let records = request
            .story_cards
            .into_iter()
            .enumerate()
            .map(|(i, card)| card_to_record(i, card))
            .collect();
        let mut store = MemoryRecordStore::from_records(records);
        let mut state = request.state;

        let output = {
            let mut env = HostEnv {
                records: &mut store,
                history: &request.history,
                memory: &request.memory,
                state: &mut state,
            };
            self.orchestrator
                .dispatch(&request.hook, &request.text, request.stop, &mut env)
        };
        let (text, stop) = match output {
            HookOutput::Text(text) => (text, request.stop),
            HookOutput::Context(text, stop) => (text, stop),
        };

        let response = HookResponse {
            text,
            stop,
            story_cards: store.into_records().into_iter().map(record_to_card).collect(),
            state,
        };
        serde_json::to_string(&response).map_err(|e| JsError::new(&format!("Serialize error: {e}")))
    }

    /// Names of the attributes this resolver knows, as a JSON array.
    pub fn attribute_names(&self) -> String {
        serde_json::to_string(&self.orchestrator.catalog().names())
            .unwrap_or_else(|_| "[]".to_string())
    }
}

impl AidChaos {
    fn build(catalog: Option<AttributeCatalog>, seed: Option<u64>) -> Result<AidChaos, JsError> {
        let mut builder = Orchestrator::builder();
        if let Some(catalog) = catalog {
            builder = builder.catalog(catalog);
        }
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let orchestrator = builder
            .build()
            .map_err(|e| JsError::new(&format!("Resolver build error: {e}")))?;
        Ok(AidChaos { orchestrator })
    }
}
