use std::{sync::Arc, time::Instant};

use super::settings::Settings;
use crate::repositories::PollStore;

/// Shared by every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PollStore>,
    pub settings: Arc<Settings>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn PollStore>, settings: Settings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
            started_at: Instant::now(),
        }
    }
}
