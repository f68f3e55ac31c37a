// Standalone card-table server, for pointing the harness at by hand

use std::net::SocketAddr;
use tracing::{Level, info};
use tracing_subscriber;

// Same app the integration tests serve
include!("../../tests/test_server_app.rs");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let app = create_app().await;

    // Port from the first argument, defaulting to the harness's default URL
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    info!("Card-table server listening on http://{}", addr);

    axum::serve(listener, app).await.expect("Server failed");
}
