//! Provider descriptors, transport and request execution.
//!
//! - [`descriptor`]: static per-provider configuration and wire dialect.
//! - [`registry`]: priority ordering and the active default.
//! - [`traits`] / [`http`]: the HTTP seam and its `reqwest` implementation.
//! - [`wire`]: dialect-specific request encoding and completion decoding.
//! - [`retry`]: one provider, bounded retries, per-attempt deadlines.
//! - [`fallback`]: ordered walk across providers with offline degradation.

pub mod descriptor;
pub mod fallback;
pub mod http;
pub mod registry;
pub mod retry;
pub mod traits;
pub mod wire;

pub use descriptor::{Capabilities, Capability, GenerationParams, ProviderDescriptor, ProviderKind};
pub use fallback::FallbackOrchestrator;
pub use http::ReqwestTransport;
pub use registry::ProviderRegistry;
pub use retry::{RequestExecutor, ResultCandidate};
pub use traits::{HttpRequest, HttpResponse, Transport};
pub use wire::Prompt;
