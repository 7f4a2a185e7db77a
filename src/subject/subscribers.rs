use std::{
  cell::{Cell, RefCell},
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::ReentrantMutex;
use smallvec::SmallVec;

use crate::{
  observer::{BoxedObserver, Observer},
  subscription::Registry,
  util::panic_message,
};

thread_local! {
  /// Observer callbacks currently running on this thread, across all slots.
  static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

struct Delivering;

impl Delivering {
  fn enter() -> Self {
    DELIVERING.with(|depth| depth.set(depth.get() + 1));
    Delivering
  }

  fn active() -> bool { DELIVERING.with(Cell::get) > 0 }
}

impl Drop for Delivering {
  fn drop(&mut self) { DELIVERING.with(|depth| depth.set(depth.get() - 1)); }
}

/// One subscribed observer.
///
/// The observer sits behind a re-entrant lock so that closing the slot from
/// another thread waits for an in-flight delivery, while closing it from
/// inside its own `next` (same thread) does not deadlock.
pub(crate) struct Slot<Item> {
  closed: AtomicBool,
  observer: ReentrantMutex<RefCell<BoxedObserver<Item>>>,
}

impl<Item> Slot<Item> {
  fn new(observer: BoxedObserver<Item>) -> Self {
    Self { closed: AtomicBool::new(false), observer: ReentrantMutex::new(RefCell::new(observer)) }
  }

  /// Deliver one value, isolating a panicking observer.
  pub(crate) fn deliver(&self, value: Item) {
    let guard = self.observer.lock();
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    let Ok(mut observer) = guard.try_borrow_mut() else {
      panic!("re-entrant emission: a value was emitted from inside this observer's own callback");
    };
    let _delivering = Delivering::enter();
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer.next(value))) {
      tracing::error!(panic = panic_message(&*payload), "observer panicked while handling a value");
    }
  }

  /// Stop further deliveries.
  ///
  /// Called outside any observer callback, this returns once no delivery is
  /// running on another thread. Called from inside a callback it only marks
  /// the slot closed: a delivery already running on another thread may
  /// still finish, but nothing starts after this returns. Two threads that
  /// close each other's observers from inside their callbacks therefore
  /// cannot deadlock.
  pub(crate) fn close(&self) {
    self.closed.store(true, Ordering::Release);
    if !Delivering::active() {
      drop(self.observer.lock());
    }
  }

  pub(crate) fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

/// Subscribers container of a subject, keyed by subscription ID.
pub(crate) struct Subscribers<Item> {
  inner: Registry<Arc<Slot<Item>>>,
}

impl<Item> Default for Subscribers<Item> {
  fn default() -> Self { Self { inner: Registry::default() } }
}

impl<Item> Subscribers<Item> {
  /// Add an observer and return its ID together with its slot.
  pub(crate) fn add(&mut self, observer: BoxedObserver<Item>) -> (usize, Arc<Slot<Item>>) {
    let slot = Arc::new(Slot::new(observer));
    let id = self.inner.add(slot.clone());
    (id, slot)
  }

  #[inline]
  pub(crate) fn remove(&mut self, id: usize) -> Option<Arc<Slot<Item>>> { self.inner.remove(id) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.inner.len() }

  #[inline]
  pub(crate) fn snapshot(&self) -> SmallVec<[Arc<Slot<Item>>; 2]> { self.inner.snapshot() }
}

/// Broadcast value to a snapshot of slots with optimal cloning.
///
/// The value is cloned for every slot except the last one, which receives
/// the moved value. Closed slots are skipped without consuming a clone.
pub(crate) fn broadcast_value<Item: Clone>(slots: &[Arc<Slot<Item>>], value: Item) {
  let mut iter = slots.iter().filter(|slot| !slot.is_closed()).peekable();
  while let Some(slot) = iter.next() {
    if iter.peek().is_some() {
      slot.deliver(value.clone());
    } else {
      slot.deliver(value);
      break;
    }
  }
}
