//! Async wrapper crate for the [Nexus Mods](https://www.nexusmods.com) public API.
//!
//! ## Usage
//!
//! First, create a [`Client`] with your personal API key and the domain name of the game you're
//! interested in (the part after `nexusmods.com/` in the game's URL). Then open a session:
//!
//! ```no_run
//! # use nexusmods::client::Client;
//! # #[tokio::main]
//! # async fn main() -> nexusmods::error::Result<()> {
//! let client = Client::new("MY_API_KEY", "morrowind")?;
//! client.open().await?;
//! # Ok(()) }
//! ```
//!
//! Now it's ready to go! For example you can get mod #49565 like this:
//!
//! ```no_run
//! # use nexusmods::client::Client;
//! # #[tokio::main]
//! # async fn main() -> nexusmods::error::Result<()> {
//! # let client = Client::new("MY_API_KEY", "morrowind")?;
//! # client.open().await?;
//! let m = client.get_mod(49565).await?;
//!
//! assert_eq!(m.mod_id, 49565);
//! # Ok(()) }
//! ```
//!
//! Once you're done, close the session. Every request made on a closed client fails with
//! [`Error::Closed`]. A closed client can be opened again.
//!
//! ```no_run
//! # use nexusmods::client::Client;
//! # #[tokio::main]
//! # async fn main() -> nexusmods::error::Result<()> {
//! # let client = Client::new("MY_API_KEY", "morrowind")?;
//! # client.open().await?;
//! client.close().await?;
//!
//! assert!(client.get_mod(49565).await.is_err());
//! # Ok(()) }
//! ```
//!
//! ## Rate Limiting
//!
//! Every request, successful or not, spends a token from the client's [`RateLimiter`]. When the
//! bucket is empty, requests wait until it refills. By default each client gets its own bucket of
//! 28 requests per second; build clients with the same limiter to make them share it:
//!
//! ```
//! # use nexusmods::client::{Client, RateLimiter};
//! use std::time::Duration;
//!
//! # fn main() -> nexusmods::error::Result<()> {
//! let limiter = RateLimiter::new(100, Duration::from_secs(30));
//!
//! let a = Client::builder("MY_API_KEY", "morrowind").rate_limiter(limiter.clone()).build()?;
//! let b = Client::builder("MY_API_KEY", "oblivion").rate_limiter(limiter).build()?;
//! # Ok(()) }
//! ```
//!
//! Note that the API also enforces daily and hourly quotas on its side. Hitting them results in a
//! 429 HTTP response code, reported as [`Error::Remote`].
//!
//! ## Logging
//!
//! `nexusmods` emits [`tracing`](https://docs.rs/tracing) events (sessions, requests, downloads)
//! but never installs a subscriber.
//!
//! [`Client`]: client/struct.Client.html
//! [`RateLimiter`]: client/struct.RateLimiter.html
//! [`Error::Closed`]: error/enum.Error.html#variant.Closed
//! [`Error::Remote`]: error/enum.Error.html#variant.Remote

/// Client related structures.
pub mod client;

/// Error management.
pub mod error;

/// Mod management.
pub mod mods;

/// Mod files and downloads.
pub mod file;

/// Games and their categories.
pub mod game;

/// The current user, their tracked mods and endorsements.
pub mod user;

/// Site colour schemes.
pub mod colour_scheme;
