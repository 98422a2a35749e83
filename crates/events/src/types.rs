//! Handler and sink types for the event system

use std::sync::Arc;

/// Error a handler may return; it is logged and never reaches the emitter
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by every event handler
pub type HandlerResult = Result<(), HandlerError>;

/// A registered event callback
pub type Handler<P> = Arc<dyn Fn(&P) -> HandlerResult + Send + Sync>;

/// Anything that can broadcast a named event
///
/// Emission is fire-and-forget: implementations must contain handler
/// failures so the emitting call path is never affected by them.
pub trait EventSink<P> {
    /// Broadcast `payload` under `name`, returning how many handlers
    /// completed successfully
    fn emit(&self, name: &str, payload: &P) -> usize;
}
