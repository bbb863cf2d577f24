/// Bus settings and layered configuration loading.
pub mod config;
/// Error types: bus taxonomy re-exports, settings and logging errors.
pub mod error;
/// Flexible logging (filters, console and file sinks).
pub mod logging;
/// Pub/Sub: Bus, Subscriber, Subscription, schedulers and diagnostics.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use config::{BusConfig, Settings};
/// Operation errors and status codes.
pub use error::{
    BusError, ErrorExt, FaultKind, LoggingError, Operation, SettingsError, StatusCode,
};
/// Logging setup.
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingHandle};
/// Pub/Sub API.
pub use pubsub::{
    BoxError, Bus, BusBuilder, BusStats, ChannelSink, DiagnosticSink, ManualScheduler, Message,
    Scheduler, Subscriber, Subscription, Task, TokioScheduler, TracingSink,
};
