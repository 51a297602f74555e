// Application layer - use cases and orchestration shared by the CLI and the
// HTTP API. Mutations validate here; the settlement engine in `domain` only
// ever sees a finished snapshot.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
