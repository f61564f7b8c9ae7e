//! Switchyard - resilient request gateway for completion providers
//!
//! This crate routes keyword extraction, text generation and question
//! answering to one of several interchangeable completion backends. Each
//! call goes through a cache, bounded retries with exponential backoff
//! under a per-attempt deadline, and ordered fallback across providers.
//! Extraction finally degrades to an offline heuristic, so it always
//! produces a result. Provider responses of any shape are normalized into
//! one canonical structure per operation.
//!
//! # Extraction Example
//!
//! ```rust,no_run
//! use switchyard::{RequestGateway, RequestOptions, Switchyard};
//!
//! #[tokio::main]
//! async fn main() -> switchyard::Result<()> {
//!     let gateway = Switchyard::builder().build()?;
//!
//!     let keywords = gateway
//!         .extract(
//!             "Required: 5+ years of Rust. Nice to have: Kubernetes.",
//!             &RequestOptions::default().max_items(10),
//!         )
//!         .await?;
//!
//!     println!("high: {:?} (degraded: {})", keywords.high, keywords.degraded);
//!     Ok(())
//! }
//! ```
//!
//! # Answer Example
//!
//! ```rust,no_run
//! use switchyard::{RequestGateway, RequestOptions, Switchyard};
//!
//! #[tokio::main]
//! async fn main() -> switchyard::Result<()> {
//!     let gateway = Switchyard::builder().build()?;
//!
//!     let answer = gateway
//!         .answer(
//!             "Is remote work possible?",
//!             "The role is fully remote within the EU.",
//!             &RequestOptions::default().provider("anthropic"),
//!         )
//!         .await?;
//!
//!     println!("{} ({:.2})", answer.answer, answer.confidence);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod gateway;
pub mod heuristic;
pub mod normalize;
pub mod prompts;
pub mod providers;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use config::GatewayConfig;
pub use error::{Result, SwitchyardError};
pub use events::GatewayEvent;
pub use gateway::{Gateway, Switchyard, SwitchyardBuilder};
pub use providers::{ProviderDescriptor, ProviderKind};
pub use stats::ProviderStats;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use traits::RequestGateway;
pub use version::{BuildInfo, PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    AnswerResult, CanonicalResult, KeywordResult, Operation, RequestEnvelope, RequestOptions,
    Signals, TextResult,
};
