//! Reference-counted subscription multiplexer
//!
//! [`SubscriptionMultiplexer`] shares one hot source among any number of
//! subscribers and counts them. When the count goes from 0 to 1 it runs the
//! `on_first_subscribe` hook (typically registering a platform listener);
//! when it goes from 1 to 0 it runs `on_last_unsubscribe`. Nothing in between
//! runs either hook, however many subscribers come and go.
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicBool, Ordering},
//!   Arc,
//! };
//!
//! use rxmux::prelude::*;
//!
//! let listening = Arc::new(AtomicBool::new(false));
//! let (on, off) = (listening.clone(), listening.clone());
//!
//! let keys = SubscriptionMultiplexer::new(Subject::<String>::new())
//!   .on_first_subscribe(move || Ok(on.store(true, Ordering::SeqCst)))
//!   .on_last_unsubscribe(move || Ok(off.store(false, Ordering::SeqCst)));
//!
//! let mut a = keys.subscribe(|_| {}).unwrap();
//! let mut b = keys.subscribe(|_| {}).unwrap();
//! assert!(listening.load(Ordering::SeqCst));
//!
//! a.unsubscribe();
//! assert!(listening.load(Ordering::SeqCst));
//! b.unsubscribe();
//! assert!(!listening.load(Ordering::SeqCst));
//! ```

mod lifecycle;
mod multiplex_subscription;

use std::{marker::PhantomData, sync::Arc};

use lifecycle::Lifecycle;
pub use lifecycle::Hook;
pub use multiplex_subscription::MultiplexSubscription;

use crate::{
  error::{BoxError, Result},
  observable::Observable,
  observer::BoxedObserver,
};

/// Shares a hot source among subscribers and brackets each window of
/// non-zero subscribers with the activation hooks.
///
/// Clones share the same source, counter and hooks.
///
/// # Hook contract
///
/// - `on_first_subscribe` runs on the subscribing thread, before the new
///   subscriber is attached. If it returns an error the subscribe call fails
///   with [`Error::Activation`](crate::error::Error::Activation), the counter
///   is rolled back and the next subscribe retries activation. If it panics,
///   the counter is rolled back and the panic propagates.
/// - `on_last_unsubscribe` runs on the disposing thread. Errors and panics
///   are logged and swallowed; the subscription is disposed regardless.
/// - Hooks of one instance never run concurrently with each other and must
///   not subscribe to or unsubscribe from the same instance.
pub struct SubscriptionMultiplexer<Item, S> {
  source: S,
  lifecycle: Arc<Lifecycle>,
  _item: PhantomData<fn(Item)>,
}

impl<Item, S> SubscriptionMultiplexer<Item, S>
where
  S: Observable<Item>,
{
  /// Multiplex `source` with no hooks.
  pub fn new(source: S) -> Self {
    Self { source, lifecycle: Arc::new(Lifecycle::default()), _item: PhantomData }
  }

  /// Multiplex `source` with both hooks.
  pub fn with_hooks<F, L>(source: S, on_first_subscribe: F, on_last_unsubscribe: L) -> Self
  where
    F: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
    L: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
  {
    Self::new(source).on_first_subscribe(on_first_subscribe).on_last_unsubscribe(on_last_unsubscribe)
  }

  /// Set the hook run on every 0 -> 1 transition of the subscriber count.
  pub fn on_first_subscribe<F>(self, hook: F) -> Self
  where
    F: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
  {
    self.lifecycle.set_on_first(Box::new(hook));
    self
  }

  /// Set the hook run on every 1 -> 0 transition of the subscriber count.
  pub fn on_last_unsubscribe<F>(self, hook: F) -> Self
  where
    F: FnMut() -> std::result::Result<(), BoxError> + Send + 'static,
  {
    self.lifecycle.set_on_last(Box::new(hook));
    self
  }
}

impl<Item, S> SubscriptionMultiplexer<Item, S> {
  /// Current number of live subscriptions.
  pub fn subscriber_count(&self) -> usize { self.lifecycle.count() }

  /// Whether the source is currently activated.
  pub fn is_active(&self) -> bool { self.subscriber_count() > 0 }

  /// The multiplexed source.
  pub fn source(&self) -> &S { &self.source }
}

impl<Item, S: Clone> Clone for SubscriptionMultiplexer<Item, S> {
  fn clone(&self) -> Self {
    Self { source: self.source.clone(), lifecycle: self.lifecycle.clone(), _item: PhantomData }
  }
}

impl<Item, S> Observable<Item> for SubscriptionMultiplexer<Item, S>
where
  S: Observable<Item>,
{
  type Unsub = MultiplexSubscription<S::Unsub>;

  fn actual_subscribe(&self, observer: BoxedObserver<Item>) -> Result<Self::Unsub> {
    let lease = self.lifecycle.acquire()?;
    // Releases the count again if attaching fails or unwinds.
    let pending = lease.pending();
    let unsub = self.source.actual_subscribe(observer)?;
    Ok(MultiplexSubscription::new(unsub, pending.keep()))
  }
}
