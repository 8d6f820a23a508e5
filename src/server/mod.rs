//! HTTP surface for triggering indexing.
//!
//! Three endpoints drive the coordinator:
//! - `GET /api/startIndexing` starts a full run
//! - `GET /api/stopIndexing` stops it
//! - `POST /api/indexPage` indexes one page

mod handlers;
mod routes;

pub use handlers::IndexingResponse;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::crawler::IndexingCoordinator;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<IndexingCoordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<IndexingCoordinator>) -> Self {
        Self { coordinator }
    }
}

/// Start the web server and serve until the process exits.
pub async fn serve(
    coordinator: Arc<IndexingCoordinator>,
    bind_address: &str,
) -> anyhow::Result<()> {
    let app = create_router(AppState::new(coordinator));

    let addr: SocketAddr = bind_address.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
