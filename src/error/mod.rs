pub mod global;
pub mod handler;
pub mod logging;
pub mod parser;

pub use global::{HubError, HubResult};
pub use handler::{HandlerError, HandlerResult};
pub use logging::LoggingError;
pub use parser::ParseError;
