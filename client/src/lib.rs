//! # puppetdb
//!
//! Read-only client for the PuppetDB v4 query API.
//!
//! Queries are expressed as a [`Query`] tree and encoded to the PuppetDB
//! AST on the wire. Listing endpoints return a [`RecordStream`]: the first
//! page is fetched when the call is awaited, later pages are fetched only
//! as the stream is advanced.
//!
//! ```no_run
//! use futures::StreamExt;
//! use puppetdb::{ClientConfig, NodeOptions, PuppetDb, Query};
//!
//! # async fn run() -> Result<(), puppetdb::Error> {
//! let db = PuppetDb::new(&ClientConfig::default())?;
//! let query = Query::And(vec![Query::equals("catalog_environment", "production")]);
//! let mut nodes = db.nodes(Some(&query), NodeOptions::default()).await?;
//! while let Some(node) = nodes.next().await {
//!     println!("{}", node?.certname);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod query;
mod stream;
mod types;

pub use client::{ClientConfig, NodeOptions, PuppetDb};
pub use error::Error;
pub use query::Query;
pub use stream::RecordStream;
pub use types::{Event, EventCounts, Fact, Node, NodeStatus, Report};
