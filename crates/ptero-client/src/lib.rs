//! Request dispatch core for the Pterodactyl panel API
//!
//! [`RequestDispatcher`] turns a path, verb and [`RequestParams`] into an
//! authenticated HTTP request, classifies the response into a payload or a
//! [`PteroError`], and reports each call through `receive` and `debug`
//! events on an [`events::EventBus`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod query;
pub mod session;
pub mod types;

pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use dispatcher::RequestDispatcher;
pub use error::{PteroError, Result};
pub use outcome::RequestOutcome;
pub use query::{build_query_string, Filter, QueryOptions};
pub use types::*;
