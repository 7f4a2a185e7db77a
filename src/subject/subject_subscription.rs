use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use parking_lot::Mutex;

use super::subscribers::{Slot, Subscribers};
use crate::subscription::SubscriptionLike;

/// Subscription handle for a Subject.
///
/// When unsubscribed, the observer's slot is closed first (so no further
/// value reaches it, even from a broadcast snapshot taken earlier) and then
/// removed from the subject.
///
/// # Design
///
/// - **Shared Ownership**: Holds a reference-counted pointer to the Subject's
///   observers list rather than borrowing the Subject.
/// - **Shared State**: Clones share one `closed` flag, so disposal happens
///   once no matter how many clones call `unsubscribe`.
pub struct SubjectSubscription<Item> {
  inner: Arc<Inner<Item>>,
}

struct Inner<Item> {
  observers: Arc<Mutex<Subscribers<Item>>>,
  slot: Arc<Slot<Item>>,
  id: usize,
  closed: AtomicBool,
}

impl<Item> SubjectSubscription<Item> {
  pub(crate) fn new(observers: Arc<Mutex<Subscribers<Item>>>, id: usize, slot: Arc<Slot<Item>>) -> Self {
    Self { inner: Arc::new(Inner { observers, slot, id, closed: AtomicBool::new(false) }) }
  }

  /// The slot this subscription controls; used to replay a cached value.
  pub(crate) fn slot(&self) -> &Slot<Item> { &self.inner.slot }
}

impl<Item> Clone for SubjectSubscription<Item> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<Item> SubscriptionLike for SubjectSubscription<Item> {
  fn unsubscribe(&mut self) {
    if self.inner.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    self.inner.slot.close();
    let _slot = self.inner.observers.lock().remove(self.inner.id);
  }

  fn is_closed(&self) -> bool { self.inner.closed.load(Ordering::Acquire) }
}

impl<Item> std::fmt::Debug for SubjectSubscription<Item> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubjectSubscription")
      .field("id", &self.inner.id)
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
