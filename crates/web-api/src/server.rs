use crate::{handlers, websocket};
use arb_engine_orchestrator::EngineHandle;
use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    engine: EngineHandle,
}

impl ApiServer {
    #[must_use]
    pub const fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/status", get(handlers::get_status))
            .route("/api/withdrawals", get(handlers::list_withdrawals))
            .route("/api/withdrawals/config", put(handlers::update_withdrawal_config))
            .route("/api/withdrawals/manual", put(handlers::request_manual_withdrawal))
            .route("/api/withdrawals/emergency", put(handlers::request_emergency_withdrawal))
            .route("/api/balance/adjust", put(handlers::adjust_balance))
            .route("/api/engine/preflight", put(handlers::run_preflight))
            .route("/api/engine/sim", put(handlers::start_sim))
            .route("/api/engine/live", put(handlers::start_live))
            .route("/api/engine/stop", put(handlers::stop))
            .route("/ws", get(websocket::websocket_handler))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.engine.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
