// src/lib.rs
// Public library surface for integration tests and the binaries.

pub mod aggregate;
pub mod api;
pub mod companies;
pub mod config;
pub mod feed;
pub mod filters;
pub mod oracle;
pub mod probe;
pub mod professionals;
pub mod session;
pub mod settings;
pub mod sources;
pub mod telemetry;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregator, OpportunityItem, SearchError, SearchOutcome, SearchReport};
pub use crate::api::{router, AppState};
pub use crate::sources::{SourceDescriptor, SourceRegistry, SourceStatus};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a compact tracing subscriber unless one is already set.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aggregate=info,feed=warn,oracle=warn,info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
