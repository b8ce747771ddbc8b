/// Process configuration: hub section and logging section.
pub mod config;
/// Error types: topic parsing, handler failures, logging, top-level errors.
pub mod error;
/// Publish/subscribe hub: subscriptions, index, dispatch.
pub mod hub;
/// Structured logging (formatting, filters, sinks).
pub mod logging;
/// Attribute-based topics.
pub mod topic;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Configuration.
pub use config::{HubConfig, Settings};
/// Error and result types.
pub use error::{HandlerError, HandlerResult, HubError, HubResult, LoggingError, ParseError};
/// Hub API: the hub itself, events, handlers and options.
pub use hub::{
    on_finish, once, sync, wait, Event, FinishCallback, Handler, HandlerFuture, Hub, HubStats,
    Payload, PublishOption, StatsSnapshot, SubId, SubscribeOption, Subscription,
};
/// Cancellation context passed to handlers.
pub use tokio_util::sync::CancellationToken;
/// Logging setup.
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
/// Topics and attributes.
pub use topic::{Attr, AttrMap, IntoTopic, Topic, ANY};
