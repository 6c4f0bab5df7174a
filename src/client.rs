mod download;
mod rate_limit;
mod session;

pub use download::{ChunkStream, DEFAULT_CHUNK_SIZE};
pub use rate_limit::{RateLimiter, DEFAULT_CAPACITY, DEFAULT_REFILL_PERIOD};
pub use session::user_agent;

use self::session::{Connection, Session, Settings};
use super::error::{Error, Result};

use bytes::Bytes;

use derivative::Derivative;

use reqwest::{Method, Response};

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use tokio::sync::RwLock;
use tokio::time::Duration;

use tracing::{debug, info, warn};

use url::Url;

/// Base URL of the public API.
pub const BASE_URL: &str = "https://api.nexusmods.com/v1";

/// Default number of concurrent connections a session opens to a single host.
pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 28;

/// The API key and game a client works with. Never printed by `Debug`.
#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct Credentials {
    #[derivative(Debug = "ignore")]
    api_key: String,
    game_domain: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, game_domain: impl Into<String>) -> Self {
        Credentials {
            api_key: api_key.into(),
            game_domain: game_domain.into(),
        }
    }

    /// Domain name of the game, as found in its Nexus Mods URL (e.g. `morrowind`).
    pub fn game_domain(&self) -> &str {
        &self.game_domain
    }
}

/// Builder for a [`Client`] with non-default settings.
///
/// ```
/// # use nexusmods::client::{Client, RateLimiter};
/// use std::time::Duration;
///
/// # fn main() -> nexusmods::error::Result<()> {
/// let limiter = RateLimiter::new(100, Duration::from_secs(30));
///
/// let skyrim = Client::builder("MY_API_KEY", "skyrimspecialedition")
///     .rate_limiter(limiter.clone())
///     .build()?;
/// let morrowind = Client::builder("MY_API_KEY", "morrowind")
///     .rate_limiter(limiter)
///     .chunk_size(1024 * 1024)
///     .build()?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    credentials: Credentials,
    base_url: String,
    rate_limiter: Option<RateLimiter>,
    max_connections_per_host: usize,
    chunk_size: usize,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Send requests to another server than [`BASE_URL`].
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Spend tokens from the given limiter. By default, every client gets its own
    /// [`RateLimiter::default`].
    pub fn rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Set the maximum number of requests in flight at once to any single host. The API and the
    /// CDN serving downloads are counted separately.
    pub fn max_connections_per_host(mut self, max: usize) -> Self {
        self.max_connections_per_host = max;
        self
    }

    /// Set the size of the chunks yielded by [`Client::stream_download`].
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set a timeout for whole requests. There is none by default.
    pub fn timeout<T: Into<Option<Duration>>>(mut self, timeout: T) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn build(self) -> Result<Client> {
        if self.credentials.game_domain.is_empty() {
            return Err(Error::CannotCreateClient(String::from(
                "Game domain mustn't be empty",
            )));
        }

        if self.max_connections_per_host == 0 || self.chunk_size == 0 {
            return Err(Error::CannotCreateClient(String::from(
                "Connection limit and chunk size must be positive",
            )));
        }

        let base_url = self.base_url.trim_end_matches('/');
        Url::parse(base_url)
            .map_err(|e| Error::CannotCreateClient(format!("Invalid base URL: {}", e)))?;

        Ok(Client {
            base_url: base_url.to_string(),
            credentials: self.credentials,
            rate_limit: self.rate_limiter.unwrap_or_default(),
            session: RwLock::new(Session::default()),
            max_connections_per_host: self.max_connections_per_host,
            chunk_size: self.chunk_size,
            timeout: self.timeout,
        })
    }
}

/// Client struct.
///
/// A client can't send anything until [`Client::open`] is called, and stops working after
/// [`Client::close`]. It can be opened again once closed. Requests may be made concurrently from
/// any number of tasks sharing the client.
#[derive(Debug)]
pub struct Client {
    base_url: String,
    credentials: Credentials,
    rate_limit: RateLimiter,
    session: RwLock<Session>,

    max_connections_per_host: usize,
    chunk_size: usize,
    timeout: Option<Duration>,
}

impl Client {
    /// Create a new client for the given API key and game, with the default settings.
    pub fn new(api_key: impl Into<String>, game_domain: impl Into<String>) -> Result<Self> {
        Self::builder(api_key, game_domain).build()
    }

    /// Start building a client for the given API key and game.
    pub fn builder(api_key: impl Into<String>, game_domain: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            credentials: Credentials::new(api_key, game_domain),
            base_url: String::from(BASE_URL),
            rate_limiter: None,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
        }
    }

    /// Domain name of the game this client works with.
    pub fn game_domain(&self) -> &str {
        self.credentials.game_domain()
    }

    /// The limiter every request of this client goes through.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limit
    }

    /// Start a new session, making the client usable.
    ///
    /// Fails with [`Error::AlreadyOpen`] if the previous session wasn't closed.
    pub async fn open(&self) -> Result<()> {
        self.session.write().await.open(Settings {
            api_key: &self.credentials.api_key,
            max_connections_per_host: self.max_connections_per_host,
            timeout: self.timeout,
        })?;

        info!(game_domain = %self.game_domain(), "session opened");
        Ok(())
    }

    /// Close the current session. Any request made afterwards fails with [`Error::Closed`].
    pub async fn close(&self) -> Result<()> {
        self.session.write().await.close()?;

        info!(game_domain = %self.game_domain(), "session closed");
        Ok(())
    }

    /// Whether the client currently has an open session.
    pub async fn is_open(&self) -> bool {
        self.session.read().await.is_open()
    }

    /// Send a GET request and return the whole response body.
    ///
    /// `url` is either a path relative to the base URL (`/games.json`) or an absolute URL.
    pub async fn get(&self, url: &str, payload: Option<&JsonValue>) -> Result<Bytes> {
        self.request(Method::GET, url, payload).await
    }

    /// Send a POST request and return the whole response body.
    pub async fn post(&self, url: &str, payload: Option<&JsonValue>) -> Result<Bytes> {
        self.request(Method::POST, url, payload).await
    }

    /// Send a DELETE request and return the whole response body.
    pub async fn delete(&self, url: &str, payload: Option<&JsonValue>) -> Result<Bytes> {
        self.request(Method::DELETE, url, payload).await
    }

    /// Send a GET request and return its body as a [`ChunkStream`].
    pub async fn stream_download(&self, url: &str) -> Result<ChunkStream> {
        let (response, connection) = self.send(Method::GET, url, None).await?;
        Ok(ChunkStream::new(response, connection, self.chunk_size))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: Option<&JsonValue>,
    ) -> Result<T> {
        let body = self.get(url, payload).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: Option<&JsonValue>,
    ) -> Result<T> {
        let body = self.post(url, payload).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: Option<&JsonValue>,
    ) -> Result<T> {
        let body = self.delete(url, payload).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Path of an endpoint under the current game, e.g. `/games/morrowind/mods/1.json`.
    pub(crate) fn game_endpoint(&self, endpoint: &str) -> String {
        format!(
            "/games/{}{}",
            urlencoding::encode(self.game_domain()),
            endpoint
        )
    }

    fn endpoint_url(&self, url: &str) -> Result<Url> {
        if url.starts_with('/') {
            Ok(Url::parse(&format!("{}{}", self.base_url, url))?)
        } else {
            Ok(Url::parse(url)?)
        }
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        payload: Option<&JsonValue>,
    ) -> Result<Bytes> {
        let (response, _connection) = self.send(method, url, payload).await?;
        Ok(response.bytes().await?)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        payload: Option<&JsonValue>,
    ) -> Result<(Response, Connection)> {
        let url = self.endpoint_url(url)?;

        // the token is spent even if the request fails past this point
        self.rate_limit.acquire().await;
        let transport = self.session.read().await.active()?.clone();
        let connection = transport.connection(&url).await?;

        let mut request = transport.http.request(method.clone(), url.clone());
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "request completed");

        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "API rejected the request");

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(%method, %url, error = %e, "couldn't read the error response body");
                    String::new()
                }
            };

            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok((response, connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockito::{Matcher, Server};

    use serde_json::json;

    fn client(server: &Server) -> Client {
        Client::builder("K", "morrowind")
            .base_url(server.url())
            .rate_limiter(RateLimiter::new(10, Duration::from_secs(3600)))
            .build()
            .unwrap()
    }

    #[test]
    fn client_new() {
        Client::new("K", "morrowind").unwrap();
    }

    #[test]
    #[should_panic]
    fn client_new_requires_non_empty_game_domain() {
        Client::new("K", "").unwrap();
    }

    #[test]
    fn client_rejects_invalid_base_url() {
        let result = Client::builder("K", "morrowind").base_url("not a url").build();
        assert!(matches!(result, Err(Error::CannotCreateClient(_))));
    }

    #[test]
    fn credentials_debug_hides_api_key() {
        let credentials = Credentials::new("super-secret", "morrowind");
        let printed = format!("{:?}", credentials);

        assert!(printed.contains("morrowind"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn endpoint_urls() {
        let client = Client::builder("K", "morrowind")
            .base_url("https://example.com/v1/")
            .build()
            .unwrap();

        assert_eq!(
            client.endpoint_url("/games.json").unwrap().as_str(),
            "https://example.com/v1/games.json"
        );
        assert_eq!(
            client
                .endpoint_url("https://cf-files.nexusmods.com/cdn/a b.zip")
                .unwrap()
                .as_str(),
            "https://cf-files.nexusmods.com/cdn/a%20b.zip"
        );
        assert_eq!(client.game_endpoint("/mods/1.json"), "/games/morrowind/mods/1.json");
        assert!(matches!(
            client.endpoint_url("games.json"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn requests_carry_fixed_headers() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/games.json")
            .match_header("apikey", "K")
            .match_header("user-agent", user_agent().as_str())
            .match_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = client(&server);
        client.open().await.unwrap();

        assert_eq!(client.get("/games.json", None).await.unwrap(), "[]");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn payload_is_sent_as_json() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/user/tracked_mods.json")
            .match_body(Matcher::Json(json!({"mod_id": 1})))
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;

        let client = client(&server);
        client.open().await.unwrap();

        client
            .delete("/user/tracked_mods.json", Some(&json!({"mod_id": 1})))
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn dispatch_before_open_fails() {
        let server = Server::new_async().await;
        let client = client(&server);

        assert!(matches!(
            client.get("/games.json", None).await,
            Err(Error::NotStarted)
        ));
        assert!(matches!(
            client.stream_download("/archive.zip").await,
            Err(Error::NotStarted)
        ));
    }

    #[tokio::test]
    async fn dispatch_after_close_fails() {
        let server = Server::new_async().await;
        let client = client(&server);

        client.open().await.unwrap();
        client.close().await.unwrap();

        assert!(matches!(
            client.post("/games.json", None).await,
            Err(Error::Closed)
        ));
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn open_twice_fails() {
        let server = Server::new_async().await;
        let client = client(&server);

        client.open().await.unwrap();
        assert!(matches!(client.open().await, Err(Error::AlreadyOpen)));
        assert!(client.is_open().await);
    }

    #[tokio::test]
    async fn sequential_sessions() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/games.json")
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;

        let client = client(&server);

        for _ in 0..2 {
            client.open().await.unwrap();
            client.get("/games.json", None).await.unwrap();
            client.close().await.unwrap();
        }
    }

    #[tokio::test]
    async fn remote_error_spends_one_token() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.json")
            .with_status(404)
            .with_body(r#"{"code":404,"message":"Not Found"}"#)
            .create_async()
            .await;

        let client = client(&server);
        client.open().await.unwrap();

        match client.get("/missing.json", None).await {
            Err(Error::Remote { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, r#"{"code":404,"message":"Not Found"}"#);
            }
            other => panic!("expected a remote error, got {:?}", other),
        }

        let available = client.rate_limiter().available().await;
        assert!((9.0..9.5).contains(&available), "{}", available);
    }

    #[tokio::test]
    async fn malformed_url_spends_no_token() {
        let server = Server::new_async().await;
        let client = client(&server);
        client.open().await.unwrap();

        assert!(matches!(
            client.get("games.json", None).await,
            Err(Error::InvalidUrl(_))
        ));
        assert_eq!(client.rate_limiter().available().await, 10.0);
    }

    #[tokio::test]
    async fn lifecycle_errors_spend_a_token_too() {
        let server = Server::new_async().await;
        let client = client(&server);

        client.get("/games.json", None).await.unwrap_err();

        let available = client.rate_limiter().available().await;
        assert!((9.0..9.5).contains(&available), "{}", available);
    }

    #[tokio::test]
    async fn clients_can_share_a_limiter() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/games.json")
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;

        let limiter = RateLimiter::new(10, Duration::from_secs(3600));
        let a = Client::builder("K", "morrowind")
            .base_url(server.url())
            .rate_limiter(limiter.clone())
            .build()
            .unwrap();
        let b = Client::builder("K", "oblivion")
            .base_url(server.url())
            .rate_limiter(limiter.clone())
            .build()
            .unwrap();

        a.open().await.unwrap();
        b.open().await.unwrap();
        a.get("/games.json", None).await.unwrap();
        b.get("/games.json", None).await.unwrap();

        let available = limiter.available().await;
        assert!((8.0..8.5).contains(&available), "{}", available);
    }

    #[tokio::test]
    async fn concurrent_requests_on_one_client() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/games.json")
            .with_body("[]")
            .expect(8)
            .create_async()
            .await;

        let client = std::sync::Arc::new(client(&server));
        client.open().await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get("/games.json", None).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "[]");
        }
    }
}
