//! Preference change notifications
//!
//! [`PreferenceChanges`] turns a platform preference store's change listener
//! into a multicast stream of changed keys. The listener is registered with
//! the store while at least one consumer is subscribed and unregistered when
//! the last one leaves. Every change is delivered, including repeated changes
//! of the same key.

use std::sync::Arc;

use crate::{
  error::{BoxError, Result},
  multiplexer::{MultiplexSubscription, SubscriptionMultiplexer},
  observable::Observable,
  observer::Observer,
  subject::{Subject, SubjectSubscription},
  subscription::SubscriptionWrapper,
};

/// A preference store that can report changed keys to one listener.
pub trait PreferenceListenerRegistry: Send + Sync + 'static {
  /// Start reporting changed keys to `sink`.
  fn register_listener(&self, sink: KeyChangeSink) -> std::result::Result<(), BoxError>;

  /// Stop reporting; the registry drops the sink it holds.
  fn unregister_listener(&self) -> std::result::Result<(), BoxError>;
}

/// Receives changed keys from the store and fans them out.
#[derive(Clone)]
pub struct KeyChangeSink {
  keys: Subject<String>,
}

impl KeyChangeSink {
  pub fn key_changed(&self, key: impl Into<String>) { self.keys.next(key.into()) }
}

/// Subscription handle returned by [`PreferenceChanges::on_preference_change`].
pub type PreferenceSubscription = SubscriptionWrapper<MultiplexSubscription<SubjectSubscription<String>>>;

/// Multicasts changed preference keys while anyone listens.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxmux::{preference::*, prelude::*};
///
/// #[derive(Default)]
/// struct Store(Mutex<Option<KeyChangeSink>>);
///
/// impl PreferenceListenerRegistry for Store {
///   fn register_listener(&self, sink: KeyChangeSink) -> Result<(), BoxError> {
///     *self.0.lock().unwrap() = Some(sink);
///     Ok(())
///   }
///   fn unregister_listener(&self) -> Result<(), BoxError> {
///     self.0.lock().unwrap().take();
///     Ok(())
///   }
/// }
///
/// let changes = PreferenceChanges::new(Store::default());
/// let keys = Arc::new(Mutex::new(vec![]));
/// let c_keys = keys.clone();
/// let mut subscription =
///   changes.on_preference_change(FnMutObserver(move |key: String| c_keys.lock().unwrap().push(key))).unwrap();
///
/// if let Some(sink) = changes.registry().0.lock().unwrap().as_ref() {
///   sink.key_changed("theme");
/// }
/// subscription.unsubscribe();
/// assert!(changes.registry().0.lock().unwrap().is_none());
/// assert_eq!(*keys.lock().unwrap(), vec!["theme".to_string()]);
/// ```
pub struct PreferenceChanges<R> {
  registry: Arc<R>,
  changes: SubscriptionMultiplexer<String, Subject<String>>,
}

impl<R: PreferenceListenerRegistry> PreferenceChanges<R> {
  pub fn new(registry: R) -> Self {
    let registry = Arc::new(registry);
    let keys = Subject::new();
    let sink = KeyChangeSink { keys: keys.clone() };
    let (register, unregister) = (registry.clone(), registry.clone());
    let changes = SubscriptionMultiplexer::with_hooks(
      keys,
      move || {
        register.register_listener(sink.clone())?;
        tracing::debug!("preference listener registered");
        Ok(())
      },
      move || {
        unregister.unregister_listener()?;
        tracing::debug!("preference listener unregistered");
        Ok(())
      },
    );
    Self { registry, changes }
  }

  /// Subscribe to changed keys.
  pub fn on_preference_change<O>(&self, observer: O) -> Result<PreferenceSubscription>
  where
    O: Observer<String> + Send + 'static,
  {
    self.changes.subscribe_observer(observer)
  }

  /// The change stream itself, for `subscribe` or `into_stream`.
  pub fn changes(&self) -> SubscriptionMultiplexer<String, Subject<String>> { self.changes.clone() }

  /// Whether the store currently has the listener registered.
  pub fn is_listening(&self) -> bool { self.changes.is_active() }

  pub fn registry(&self) -> &R { &self.registry }
}
