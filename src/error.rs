//! Error type shared by every component of the crate.

/// Error returned by a lifecycle hook or a platform collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Type alias for `std::result::Result` with the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers.
///
/// Only the activation path is caller-visible. Teardown failures and
/// consumer failures are isolated and logged, never returned.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
  /// The first-subscribe hook failed; the subscription was rolled back.
  #[error("activation on first subscribe failed: {source}")]
  Activation {
    #[source]
    source: BoxError,
  },
  /// A signal level outside the known range.
  #[error("{0} can't be converted to a network signal strength")]
  InvalidSignalLevel(i32),
}

impl Error {
  pub(crate) fn activation(source: BoxError) -> Self { Error::Activation { source } }

  /// Whether this error came from a failed activation edge.
  pub fn is_activation(&self) -> bool { matches!(self, Error::Activation { .. }) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxmux_macro::test]
  fn activation_error_keeps_source() {
    let err = Error::activation("listener refused".into());
    assert!(err.is_activation());
    assert_eq!(err.to_string(), "activation on first subscribe failed: listener refused");
    assert!(std::error::Error::source(&err).is_some());
  }

  #[rxmux_macro::test]
  fn signal_level_message() {
    let err = Error::InvalidSignalLevel(7);
    assert!(!err.is_activation());
    assert_eq!(err.to_string(), "7 can't be converted to a network signal strength");
  }
}
