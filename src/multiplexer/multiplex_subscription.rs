use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use super::lifecycle::Lease;
use crate::subscription::SubscriptionLike;

/// Handle to one subscription of a
/// [`SubscriptionMultiplexer`](super::SubscriptionMultiplexer).
///
/// Unsubscribing detaches the consumer from the source first and then counts
/// it down, running the deactivation hook if it was the last one. Clones
/// share the disposal state; only the first `unsubscribe` of any clone has an
/// effect. Dropping a handle does not unsubscribe; see
/// [`unsubscribe_when_dropped`](crate::subscription::SubscriptionWrapper::unsubscribe_when_dropped).
pub struct MultiplexSubscription<U> {
  inner: Arc<Inner<U>>,
}

struct Inner<U> {
  closed: AtomicBool,
  source: Mutex<Option<U>>,
  lease: Mutex<Option<Lease>>,
}

impl<U> MultiplexSubscription<U> {
  pub(super) fn new(source: U, lease: Lease) -> Self {
    Self {
      inner: Arc::new(Inner {
        closed: AtomicBool::new(false),
        source: Mutex::new(Some(source)),
        lease: Mutex::new(Some(lease)),
      }),
    }
  }
}

impl<U: SubscriptionLike> SubscriptionLike for MultiplexSubscription<U> {
  fn unsubscribe(&mut self) {
    if self.inner.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let source = self.inner.source.lock().take();
    if let Some(mut source) = source {
      source.unsubscribe();
    }
    let lease = self.inner.lease.lock().take();
    if let Some(lease) = lease {
      lease.release();
    }
  }

  fn is_closed(&self) -> bool { self.inner.closed.load(Ordering::Acquire) }
}

impl<U> Clone for MultiplexSubscription<U> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<U> std::fmt::Debug for MultiplexSubscription<U> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MultiplexSubscription")
      .field("closed", &self.inner.closed.load(Ordering::Relaxed))
      .finish()
  }
}
