use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  error::{BoxError, Error, Result},
  util::panic_message,
};

/// A lifecycle hook: activation or deactivation of the underlying source.
pub type Hook = Box<dyn FnMut() -> std::result::Result<(), BoxError> + Send>;

#[derive(Default)]
struct Hooks {
  on_first: Option<Hook>,
  on_last: Option<Hook>,
}

/// Subscriber counter and the edge lock around the hooks.
///
/// The counter only changes while `hooks` is locked, so the 0 -> 1 and
/// 1 -> 0 edges and the hooks they run are totally ordered per instance.
/// Reads of the counter take no lock.
#[derive(Default)]
pub(super) struct Lifecycle {
  count: AtomicUsize,
  hooks: Mutex<Hooks>,
}

impl Lifecycle {
  pub(super) fn set_on_first(&self, hook: Hook) { self.hooks.lock().on_first = Some(hook); }

  pub(super) fn set_on_last(&self, hook: Hook) { self.hooks.lock().on_last = Some(hook); }

  pub(super) fn count(&self) -> usize { self.count.load(Ordering::Acquire) }

  /// Count one more subscriber, activating on the first.
  ///
  /// A subscriber that is not first still waits here until an in-flight
  /// activation has finished.
  pub(super) fn acquire(self: &Arc<Self>) -> Result<Lease> {
    let mut hooks = self.hooks.lock();
    if self.count.fetch_add(1, Ordering::AcqRel) == 0 {
      let rollback = Rollback { count: &self.count, armed: true };
      if let Some(on_first) = hooks.on_first.as_mut() {
        on_first().map_err(|err| {
          tracing::warn!(error = %err, "activation failed, subscribe rolled back");
          Error::activation(err)
        })?;
      }
      rollback.disarm();
      tracing::debug!("first subscriber, source activated");
    }
    Ok(Lease { lifecycle: self.clone() })
  }

  fn release(&self) {
    let mut hooks = self.hooks.lock();
    let prev = match self.count.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1)) {
      Ok(prev) => prev,
      Err(_) => return,
    };
    if prev != 1 {
      return;
    }
    if let Some(on_last) = hooks.on_last.as_mut() {
      match catch_unwind(AssertUnwindSafe(|| on_last())) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "deactivation failed"),
        Err(payload) => tracing::warn!(panic = panic_message(&*payload), "deactivation panicked"),
      }
    }
    tracing::debug!("last subscriber gone, source deactivated");
  }
}

/// Undoes the increment of a failed or unwinding activation.
struct Rollback<'a> {
  count: &'a AtomicUsize,
  armed: bool,
}

impl Rollback<'_> {
  fn disarm(mut self) { self.armed = false; }
}

impl Drop for Rollback<'_> {
  fn drop(&mut self) {
    if self.armed {
      self.count.fetch_sub(1, Ordering::AcqRel);
    }
  }
}

/// One counted subscriber. Releasing consumes it, so it counts down once.
pub(crate) struct Lease {
  lifecycle: Arc<Lifecycle>,
}

impl Lease {
  pub(crate) fn release(self) { self.lifecycle.release() }

  /// Release on drop unless kept.
  pub(super) fn pending(self) -> PendingLease { PendingLease { lease: self, armed: true } }
}

pub(super) struct PendingLease {
  lease: Lease,
  armed: bool,
}

impl PendingLease {
  pub(super) fn keep(mut self) -> Lease {
    self.armed = false;
    Lease { lifecycle: self.lease.lifecycle.clone() }
  }
}

impl Drop for PendingLease {
  fn drop(&mut self) {
    if self.armed {
      self.lease.lifecycle.release();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxmux_macro::test]
  fn release_never_underflows() {
    let lifecycle = Arc::new(Lifecycle::default());
    let lease = lifecycle.acquire().unwrap();
    lease.release();
    lifecycle.release();
    assert_eq!(lifecycle.count(), 0);
  }

  #[rxmux_macro::test]
  fn dropped_pending_lease_releases() {
    let lifecycle = Arc::new(Lifecycle::default());
    drop(lifecycle.acquire().unwrap().pending());
    assert_eq!(lifecycle.count(), 0);

    let kept = lifecycle.acquire().unwrap().pending().keep();
    assert_eq!(lifecycle.count(), 1);
    kept.release();
    assert_eq!(lifecycle.count(), 0);
  }
}
