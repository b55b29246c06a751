//! Error types for the splicing layer.
//!
//! Most splicing failures never reach a caller: the proxy falls back to the
//! unmodified connection and logs. These types carry the failures between
//! internal steps and out of the few operations that do report them.

use eqsplice_config::ConfigError;
use eqsplice_core::{ContextId, ElementId, GraphError};
use thiserror::Error;

/// Errors raised while splicing or delivering settings.
#[derive(Debug, Error)]
pub enum SpliceError {
    /// The host graph rejected an operation.
    #[error("audio graph error: {0}")]
    Graph(#[from] GraphError),

    /// A settings message could not be decoded.
    #[error("settings error: {0}")]
    Config(#[from] ConfigError),

    /// A second engine was offered for a context that already has one.
    #[error("context {0} already has an equalizer")]
    DuplicateEngine(ContextId),

    /// Neither direct attachment nor stream capture worked for an element.
    #[error("could not attach element {element}: direct: {direct}; capture: {capture}")]
    AttachFailed {
        /// The element that stayed unprocessed.
        element: ElementId,
        /// Why direct attachment failed.
        direct: GraphError,
        /// Why stream capture failed.
        capture: GraphError,
    },
}

/// Result type for splicing operations.
pub type SpliceResult<T> = Result<T, SpliceError>;
