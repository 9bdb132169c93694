use std::sync::Arc;

use crate::persistence::MenuStore;
use crate::services::broadcast_service::Broadcaster;
use crate::state::menu::IdGenerator;

/// Shared application state handed to every handler.
///
/// The store and the broadcaster are independent: each has its own lock and
/// neither ever calls into the other.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<MenuStore>,
    pub broadcaster: Arc<Broadcaster>,
    pub ids: Arc<IdGenerator>,
}

impl AppState {
    pub fn new(store: MenuStore, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            store: Arc::new(store),
            broadcaster,
            ids: Arc::new(IdGenerator::new()),
        }
    }
}
