use crate::error::{Error, Result};

use reqwest::header::{self, HeaderMap, HeaderValue};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Duration;

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use url::Url;

/// Everything needed to open a new session.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Settings<'a> {
    pub api_key: &'a str,
    pub max_connections_per_host: usize,
    pub timeout: Option<Duration>,
}

/// The value sent in the `user-agent` header of every request, e.g.
/// `nexusmods/0.1.0 (linux; x86_64) rust`.
pub fn user_agent() -> String {
    format!(
        "{}/{} ({}; {}) rust",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

/// One of the connection slots of a host, held until dropped.
#[derive(Debug)]
pub(crate) struct Connection {
    _permit: OwnedSemaphorePermit,
    closed: CancellationToken,
}

impl Connection {
    /// Resolves once the session this connection belongs to is closed.
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.closed.clone().cancelled_owned()
    }
}

/// Connection slots, one semaphore per `host:port`.
#[derive(Debug)]
struct HostSlots {
    max_per_host: usize,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl HostSlots {
    fn new(max_per_host: usize) -> Self {
        HostSlots {
            max_per_host,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Slots of the host `key`. `closed` is checked under the lock so no host is added once
    /// `close` went through the map.
    fn host(&self, key: String, closed: &CancellationToken) -> Result<Arc<Semaphore>> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);

        if closed.is_cancelled() {
            return Err(Error::Closed);
        }

        Ok(hosts
            .entry(key)
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_host)))
            .clone())
    }

    fn close(&self) {
        let hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);

        for slots in hosts.values() {
            slots.close();
        }
    }
}

fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

/// Connection pool of an open session, with its fixed headers.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    pub http: reqwest::Client,
    slots: Arc<HostSlots>,
    closed: CancellationToken,
}

impl Transport {
    fn new(settings: Settings) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(settings.api_key)
            .map_err(|e| Error::CannotCreateClient(format!("Invalid API key: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", api_key);
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&user_agent())
                .map_err(|e| Error::CannotCreateClient(format!("Invalid User-Agent: {}", e)))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(settings.max_connections_per_host);

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        match builder.build() {
            Ok(http) => Ok(Transport {
                http,
                slots: Arc::new(HostSlots::new(settings.max_connections_per_host)),
                closed: CancellationToken::new(),
            }),
            Err(e) => Err(Error::CannotCreateClient(format!("{:?}", e))),
        }
    }

    /// Wait for one of the connection slots of the host `url` points to.
    pub async fn connection(&self, url: &Url) -> Result<Connection> {
        // a host's semaphore is only ever closed by `shutdown`
        let permit = self
            .slots
            .host(host_key(url), &self.closed)?
            .acquire_owned()
            .await
            .map_err(|_| Error::Closed)?;

        Ok(Connection {
            _permit: permit,
            closed: self.closed.clone(),
        })
    }

    /// Fail every pending and future `connection` call, and signal open connections.
    fn shutdown(&self) {
        // cancel first, see `HostSlots::host`
        self.closed.cancel();
        self.slots.close();
    }
}

/// Lifecycle of the connection pool owned by a client.
///
/// A session only ever moves forward: `Unstarted -> Open -> Closed`. Reopening a client replaces
/// its `Closed` session with a brand new `Open` one.
#[derive(Debug, Default)]
pub(crate) enum Session {
    #[default]
    Unstarted,
    Open(Transport),
    Closed,
}

impl Session {
    pub fn open(&mut self, settings: Settings) -> Result<()> {
        if let Session::Open(_) = self {
            return Err(Error::AlreadyOpen);
        }

        *self = Session::Open(Transport::new(settings)?);
        Ok(())
    }

    pub fn active(&self) -> Result<&Transport> {
        match self {
            Session::Unstarted => Err(Error::NotStarted),
            Session::Open(transport) => Ok(transport),
            Session::Closed => Err(Error::Closed),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        self.active()?.shutdown();
        *self = Session::Closed;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Session::Open(_))
    }
}
