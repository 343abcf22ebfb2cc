//! A typed client for the [PluralKit](https://pluralkit.me) REST API.
//!
//! The same facade runs in two modes, picked when the client is built:
//!
//! ```no_run
//! # async fn run() -> Result<(), pluralkit::Error> {
//! use pluralkit::{AsyncClient, ClientConfig, SystemRef};
//!
//! let client = AsyncClient::new(ClientConfig::new().token("my token"))?;
//! let system = client.get_system(SystemRef::Me).await?;
//! println!("{:?}", system.name);
//! # Ok(())
//! # }
//! ```
//!
//! [`BlockingClient`] exposes the same operations but blocks the calling thread
//! and hands out plain iterators instead of streams.
pub mod client;
pub mod errors;
pub mod model;
pub use client::{AsyncClient, BlockingClient, Client, ClientConfig};
pub use errors::Error;
pub use model::{ApiVersion, SystemRef};

pub(crate) mod private {
    pub trait Sealed {}
}
