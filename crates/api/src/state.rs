use std::sync::Arc;

use champi_core::storage::DatasetStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Handle on the on-disk dataset tree.
    pub store: Arc<DatasetStore>,
}
