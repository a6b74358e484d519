//! Test helpers: spawn the app on a random port with mock providers and an
//! in-memory session store.

#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use service_core::config::Config;
use std::sync::Arc;
use wellness_service::config::{AuthConfig, GoogleConfig, WellnessConfig};
use wellness_service::middleware::{AccessTokenClaims, JwtVerifier};
use wellness_service::services::providers::mock::{MockTextProvider, MockVisionProvider};
use wellness_service::services::providers::ImageAnnotations;
use wellness_service::services::{InMemorySessionStore, SessionStore, WellnessAssistant};
use wellness_service::{AppState, Application};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub store: Option<Arc<InMemorySessionStore>>,
    pub text: Arc<MockTextProvider>,
}

pub struct TestAppBuilder {
    text: MockTextProvider,
    vision: MockVisionProvider,
    with_store: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            text: MockTextProvider::new(false),
            vision: MockVisionProvider::failing(),
            with_store: true,
        }
    }
}

impl TestAppBuilder {
    pub fn text(mut self, text: MockTextProvider) -> Self {
        self.text = text;
        self
    }

    pub fn vision(mut self, annotations: ImageAnnotations) -> Self {
        self.vision = MockVisionProvider::new(annotations);
        self
    }

    pub fn without_store(mut self) -> Self {
        self.with_store = false;
        self
    }

    pub async fn spawn(self) -> TestApp {
        let config = test_config();
        let text = Arc::new(self.text);
        let store = self.with_store.then(|| Arc::new(InMemorySessionStore::new()));

        let state = AppState {
            auth: JwtVerifier::new(&config.auth),
            assistant: WellnessAssistant::new(text.clone(), Arc::new(self.vision)),
            store: store
                .clone()
                .map(|s| s as Arc<dyn SessionStore>),
            config,
        };

        let app = Application::build_with_state(state)
            .await
            .expect("Failed to build application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            let _ = app.run_until_stopped().await;
        });

        TestApp {
            address,
            client: Client::new(),
            store,
            text,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Mocks that fail every AI call, plus an in-memory store.
    pub async fn spawn() -> TestApp {
        Self::builder().spawn().await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub fn test_config() -> WellnessConfig {
    WellnessConfig {
        common: Config {
            port: 0,
            log_level: "debug".to_string(),
            allowed_origins: vec![],
        },
        mongodb: None,
        google: GoogleConfig {
            api_key: "test-api-key".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            generative_api_base: "http://127.0.0.1:9".to_string(),
            vision_api_base: "http://127.0.0.1:9".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            audience: None,
        },
        otlp_endpoint: None,
    }
}

/// A valid bearer token for `user_id`, good for one hour.
pub fn token_for(user_id: &str) -> String {
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        email: Some(format!("{}@example.com", user_id)),
        role: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}
