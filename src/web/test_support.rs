use std::{net::SocketAddr, time::Duration};

use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    web::{AppState, router::build_router},
};

/// Configuration whose advisor model can never be reached, so no test touches the network.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.advisor.model = "nowhere/model".to_string();
    config.advisor.welcome_message = "Hi there!".to_string();
    config.advisor.request_timeout = Duration::from_secs(2);
    config
}

pub fn test_state() -> AppState {
    AppState::new(test_config()).unwrap()
}

/// Serves the full router on an ephemeral local port and returns its base URL.
pub async fn spawn_server(state: AppState) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}
