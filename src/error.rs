//! Error taxonomy for navigation and template filling.
//!
//! Configuration problems and resolution misses are deliberately *not*
//! errors: they degrade to diagnostics plus a well-formed no-match route.
//! The variants here are the few failures that reach callers, either
//! through the abort callback of a transition or through the `Result` of
//! filling a path template.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A required dynamic segment could not be filled from the supplied
    /// params when expanding a path template.
    #[error("missing param \"{name}\" when filling path template \"{template}\"")]
    MissingParam { name: String, template: String },

    /// A redirect target carried neither a name nor a path.
    #[error("invalid redirect for route \"{path}\": target has neither name nor path")]
    InvalidRedirect { path: String },

    /// A guard rejected the transition, or a newer transition superseded it
    /// before it could commit.
    #[error("navigation aborted")]
    NavigationAborted,

    /// The requested location resolves to the current route.
    #[error("avoided redundant navigation to \"{0}\"")]
    NavigationDuplicated(String),

    /// The external history mechanism rejected a state write. Adapters
    /// recover from this with a full-navigation fallback; the variant is
    /// surfaced only through diagnostics.
    #[error("history driver rejected the write: {0}")]
    DriverWrite(String),
}
