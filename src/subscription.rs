//! Subscription handles
//!
//! Every `subscribe` in this crate returns a handle implementing
//! [`SubscriptionLike`]. Handles are cheap to clone; all clones share one
//! disposal state, so disposing through any of them disposes the
//! subscription exactly once.

mod registry;

pub(crate) use registry::Registry;

/// Subscription returned from `subscribe` to allow unsubscribing.
pub trait SubscriptionLike {
  /// Detach the consumer from its source.
  ///
  /// Idempotent: only the first call has an effect. Once it returns, the
  /// consumer receives no further values.
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

impl<T: ?Sized> SubscriptionLike for Box<T>
where
  T: SubscriptionLike,
{
  #[inline]
  fn unsubscribe(&mut self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
#[derive(Clone, Debug)]
pub struct SubscriptionWrapper<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> { SubscriptionGuard(self.0) }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: SubscriptionLike> SubscriptionLike for SubscriptionWrapper<T> {
  #[inline]
  fn unsubscribe(&mut self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: SubscriptionLike>(pub(crate) T);

impl<T: SubscriptionLike> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }

  /// Whether the guarded subscription was already disposed.
  pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<T: SubscriptionLike> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;

  #[derive(Clone, Default)]
  struct Counting {
    calls: Arc<AtomicUsize>,
  }

  impl SubscriptionLike for Counting {
    fn unsubscribe(&mut self) { self.calls.fetch_add(1, Ordering::SeqCst); }

    fn is_closed(&self) -> bool { self.calls.load(Ordering::SeqCst) > 0 }
  }

  #[rxmux_macro::test]
  fn guard_unsubscribes_on_drop() {
    let inner = Counting::default();
    {
      let guard = SubscriptionWrapper(inner.clone()).unsubscribe_when_dropped();
      assert!(!guard.is_closed());
    }
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
  }

  #[rxmux_macro::test]
  fn wrapper_into_inner_keeps_subscription_alive() {
    let inner = Counting::default();
    let wrapper = SubscriptionWrapper(inner.clone());
    let _inner = wrapper.into_inner();
    assert!(!inner.is_closed());
  }

  #[rxmux_macro::test]
  fn boxed_subscription_delegates() {
    let inner = Counting::default();
    let mut boxed: Box<dyn SubscriptionLike> = Box::new(inner.clone());
    boxed.unsubscribe();
    assert!(boxed.is_closed());
  }
}
