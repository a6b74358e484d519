use crate::config::WellnessConfig;
use crate::handlers;
use crate::middleware::JwtVerifier;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::vision::{CloudVisionProvider, VisionConfig};
use crate::services::providers::{TextProvider, VisionProvider};
use crate::services::{MongoSessionStore, SessionStore, WellnessAssistant};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use service_core::observability::extract_traceparent;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Base64 photos are large; everything else is small JSON.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: WellnessConfig,
    /// `None` when no database is configured; history routes then answer 500.
    pub store: Option<Arc<dyn SessionStore>>,
    pub assistant: WellnessAssistant,
    pub auth: JwtVerifier,
}

impl AppState {
    pub fn store(&self) -> Result<&Arc<dyn SessionStore>, AppError> {
        self.store.as_ref().ok_or(AppError::DatabaseUnavailable)
    }
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: WellnessConfig) -> Result<Self, AppError> {
        let store: Option<Arc<dyn SessionStore>> = match &config.mongodb {
            Some(mongo) => {
                let db = MongoSessionStore::connect(&mongo.uri, &mongo.database).await?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Some(Arc::new(db) as Arc<dyn SessionStore>)
            }
            None => {
                tracing::warn!("MONGODB_URI not set; session history routes are disabled");
                None
            }
        };

        let text_provider: Arc<dyn TextProvider> = Arc::new(
            GeminiTextProvider::new(GeminiConfig {
                api_key: config.google.api_key.clone(),
                model: config.google.text_model.clone(),
                api_base: config.google.generative_api_base.clone(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );
        let vision_provider: Arc<dyn VisionProvider> = Arc::new(
            CloudVisionProvider::new(VisionConfig {
                api_key: config.google.api_key.clone(),
                api_base: config.google.vision_api_base.clone(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );

        if config.google.api_key.is_empty() {
            tracing::warn!("GOOGLE_API_KEY not set; AI routes will serve fallback payloads");
        }
        tracing::info!(model = %config.google.text_model, "Initialized AI providers");

        let state = AppState {
            auth: JwtVerifier::new(&config.auth),
            assistant: WellnessAssistant::new(text_provider, vision_provider),
            store,
            config,
        };

        Self::build_with_state(state).await
    }

    /// Bind and serve a prepared state. Tests use this to swap in mocks.
    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let app = router(state);

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.common.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/test-connection", get(handlers::test_connection))
        .route("/api/fitness-plan", post(handlers::fitness_plan))
        .route("/api/therapist/chat", post(handlers::therapist_chat))
        .route("/api/posture/analyze", post(handlers::analyze_posture))
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/api/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/migrate/preview", post(handlers::preview_migration))
        .route("/api/migrate", post(handlers::migrate))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            let traceparent = extract_traceparent(request.headers()).unwrap_or_default();

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                traceparent = %traceparent,
                method = %request.method(),
                uri = %request.uri().path(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// No configured origins means any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) if o != "*" => Some(value),
            Ok(_) => {
                tracing::warn!("Wildcard CORS origin ignored; list origins explicitly");
                None
            }
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
