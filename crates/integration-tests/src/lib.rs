//! End-to-end test harness for the Ruway storefront.
//!
//! [`TestApp`] builds the real router (sessions, middleware, rate limits)
//! against a `wiremock` server standing in for Supabase, and drives it with
//! `tower::ServiceExt::oneshot`. The session cookie is carried between
//! requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ruway-integration-tests
//! ```
//!
//! No network access or running services are needed.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use ruway_core::{Email, Price};
use ruway_storefront::config::{StorefrontConfig, SupabaseConfig};
use ruway_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Administrator email configured for every test app.
pub const ADMIN_EMAIL: &str = "admin@ruway.pe";

/// Administrator password accepted once [`mount_admin`] is mounted.
pub const ADMIN_PASSWORD: &str = "admin-clave-1";

/// Credentials accepted by the mocked auth backend.
pub const CUSTOMER_EMAIL: &str = "ana@ruway.pe";
pub const CUSTOMER_PASSWORD: &str = "secreto123";

/// Product ids in the fixture catalog.
pub mod fixtures {
    /// ESP32 at S/ 55.00.
    pub const ESP32: &str = "a1";
    /// Arduino Uno at S/ 45.50.
    pub const ARDUINO: &str = "a2";
    /// Oscilloscope at S/ 600.00, above the Yape ceiling on its own.
    pub const OSCILLOSCOPE: &str = "a3";
    /// Power supply at S/ 199.99, one céntimo short of free shipping.
    pub const POWER_SUPPLY: &str = "a4";
    /// Out of stock.
    pub const SOLDERING_STATION: &str = "a5";
}

/// Catalog rows served by the mocked PostgREST `products` table.
#[must_use]
pub fn product_rows() -> Value {
    json!([
        {
            "id": "a1", "name": "ESP32 DevKit", "description": "WiFi y Bluetooth",
            "price": 55, "image": "https://cdn.ruway.pe/esp32.png", "sku": "001011",
            "stock_status": "En Stock", "categories": {"slug": "microcontroladores"}
        },
        {
            "id": "a2", "name": "Arduino Uno R3", "description": "ATmega328P",
            "price": "45.50", "sku": "001012",
            "stock_status": "En Stock", "categories": {"slug": "microcontroladores"}
        },
        {
            "id": "a3", "name": "Osciloscopio Digital", "description": "2 canales, 100 MHz",
            "price": 600, "sku": "002001",
            "stock_status": "En Stock", "categories": {"slug": "herramientas"}
        },
        {
            "id": "a4", "name": "Fuente de Poder", "description": "30V 5A",
            "price": "199.99", "sku": "002002",
            "stock_status": "En Stock", "categories": {"slug": "herramientas"}
        },
        {
            "id": "a5", "name": "Estación de Soldadura", "description": "Control digital",
            "price": 250, "sku": "002003",
            "stock_status": "Agotado", "categories": {"slug": "herramientas"}
        }
    ])
}

/// Read a serialized price.
///
/// Prices travel as decimal strings whose scale depends on the source row,
/// so compare them as [`Price`] values rather than text.
///
/// # Panics
///
/// Panics if `value` is not a price.
#[must_use]
pub fn price_of(value: &Value) -> Price {
    serde_json::from_value(value.clone()).unwrap_or_else(|e| panic!("not a price: {value} ({e})"))
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The storefront router wired to a mocked Supabase project.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    pub backend: MockServer,
}

impl TestApp {
    /// Start a mocked backend with the fixture catalog and auth endpoints.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    pub async fn spawn() -> Self {
        let backend = MockServer::start().await;
        mount_catalog(&backend).await;
        mount_auth(&backend).await;
        Self::with_backend(backend)
    }

    /// Build the app against a backend the caller has already configured.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn with_backend(backend: MockServer) -> Self {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            supabase: SupabaseConfig {
                url: Url::parse(&format!("{}/", backend.uri())).expect("mock server uri"),
                anon_key: SecretString::from("test-anon-key"),
            },
            admin_email: Email::parse(ADMIN_EMAIL).expect("admin email"),
            catalog_cache_ttl: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config).expect("failed to build app state");

        Self {
            router: ruway_storefront::app(state),
            cookie: None,
            backend,
        }
    }

    /// Send a GET request.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, None).await
    }

    /// Forget the session cookie, as a new browser would.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Sign in with the fixture customer.
    ///
    /// # Panics
    ///
    /// Panics if sign-in does not succeed.
    pub async fn sign_in(&mut self) -> TestResponse {
        let response = self
            .post(
                "/auth/login",
                json!({"email": CUSTOMER_EMAIL, "password": CUSTOMER_PASSWORD}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "sign in failed: {:?}", response.body);
        response
    }

    /// Sign in as the administrator, mounting their credentials first.
    ///
    /// # Panics
    ///
    /// Panics if sign-in does not succeed.
    pub async fn sign_in_as_admin(&mut self) -> TestResponse {
        mount_admin(&self.backend).await;
        let response = self
            .post(
                "/auth/login",
                json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "admin sign in failed: {:?}", response.body);
        response
    }

    /// Number of requests the backend has received for `path`.
    ///
    /// # Panics
    ///
    /// Panics if request recording is disabled on the mock server.
    pub async fn backend_hits(&self, path: &str) -> usize {
        self.backend
            .received_requests()
            .await
            .expect("request recording is enabled")
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }

    /// Add `quantity` of `product_id` to the cart, asserting success.
    ///
    /// # Panics
    ///
    /// Panics if the product cannot be added.
    pub async fn add_to_cart(&mut self, product_id: &str, quantity: i64) -> TestResponse {
        let response = self
            .post(
                "/cart/add",
                json!({"product_id": product_id, "quantity": quantity}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "add failed: {:?}", response.body);
        response
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Serve the fixture catalog, categories and settings.
pub async fn mount_catalog(backend: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_rows()))
        .mount(backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Microcontroladores", "slug": "microcontroladores"},
            {"id": 2, "name": "Herramientas", "slug": "herramientas"}
        ])))
        .mount(backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"company_name": "Ruway Electronics", "yape_qr": "https://cdn.ruway.pe/yape-qr.png"}
        ])))
        .mount(backend)
        .await;
}

/// Accept the fixture customer's credentials and reject everything else.
pub async fn mount_auth(backend: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(
            json!({"email": CUSTOMER_EMAIL, "password": CUSTOMER_PASSWORD}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-ana",
            "token_type": "bearer",
            "user": {"id": "u-ana", "email": CUSTOMER_EMAIL, "user_metadata": {}}
        })))
        .mount(backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .with_priority(10)
        .mount(backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Ana Quispe", "dni": "72345678", "phone": "987654321"}
        ])))
        .mount(backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(backend)
        .await;
}

/// Accept the administrator's credentials.
pub async fn mount_admin(backend: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-admin",
            "token_type": "bearer",
            "user": {"id": "u-admin", "email": ADMIN_EMAIL, "user_metadata": {}}
        })))
        .mount(backend)
        .await;
}
