use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::settings::{InstitutionSettings, SettingsHub};
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Event lines waiting to be written ahead of the current response.
pub type Outbox = Rc<RefCell<Vec<serde_json::Value>>>;

pub struct AppState {
    pub store: Box<dyn Store>,
    pub db_path: PathBuf,
    pub seed: bool,
    pub settings: SettingsHub,
    pub events: Outbox,
}

impl AppState {
    pub fn new(config: &Config, store: Box<dyn Store>) -> Self {
        let events: Outbox = Rc::new(RefCell::new(Vec::new()));
        let mut settings = SettingsHub::new(InstitutionSettings {
            logo_url: None,
            institution_name: config.institution_name.clone(),
        });

        settings.subscribe(|s| {
            tracing::info!(
                institution = %s.institution_name,
                logo = s.logo_url.as_deref().unwrap_or("-"),
                "institution settings changed"
            );
        });
        let outbox = Rc::clone(&events);
        settings.subscribe(move |s| {
            outbox.borrow_mut().push(json!({
                "event": "settings.changed",
                "payload": s,
            }));
        });

        AppState {
            store,
            db_path: config.db_path.clone(),
            seed: config.seed,
            settings,
            events,
        }
    }

    pub fn drain_events(&self) -> Vec<serde_json::Value> {
        self.events.borrow_mut().drain(..).collect()
    }
}
