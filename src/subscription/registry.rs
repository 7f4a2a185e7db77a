use smallvec::SmallVec;

/// A container of entries with ID-based tracking.
///
/// Subjects keep their observer slots here: `add` hands out a unique ID that
/// the subscription handle later uses to remove exactly its own slot.
///
/// # Design
///
/// - **SmallVec Optimization**: Uses `SmallVec<[_; 2]>` to avoid heap
///   allocation for the common case of 0-2 subscribers.
/// - **Monotonic IDs**: IDs are never reused, so a stale handle can never
///   remove a slot that was added after its own was removed.
pub(crate) struct Registry<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for Registry<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> Registry<U> {
  /// Add an item and return its unique ID.
  #[inline]
  pub(crate) fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  /// Remove an item by ID.
  pub(crate) fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

}

impl<U: Clone> Registry<U> {
  /// Clone every item out, in insertion order.
  ///
  /// Broadcasting works on a snapshot so the registry lock is not held while
  /// observers run.
  pub(crate) fn snapshot(&self) -> SmallVec<[U; 2]> {
    self.items.iter().map(|(_, item)| item.clone()).collect()
  }
}
