//! Observer trait and implementations
//!
//! An observer is the consumer end of a hot source. The sources in this crate
//! never complete and never error, so an observer only receives values.

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: the consumer of values fanned out by a hot source.
///
/// A source calls `next` once per emission, from whichever thread ingested
/// the value. Calls to one observer never overlap.
pub trait Observer<Item> {
  /// Receive the next value from the source.
  fn next(&mut self, value: Item);
}

/// Boxed observer stored by the subscriber registries.
///
/// `Send` because emissions are delivered on the producer's thread.
pub type BoxedObserver<Item> = Box<dyn Observer<Item> + Send>;

impl<Item, O> Observer<Item> for Box<O>
where
  O: Observer<Item> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }
}

// ============================================================================
// FnMutObserver - Closure adapter
// ============================================================================

/// Adapter that lets a closure act as an observer.
///
/// This is what `subscribe(|v| ...)` wraps the closure in.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }
}

/// Conversion into the boxed observer stored by a source.
pub trait IntoBoxedObserver<Item> {
  fn into_boxed(self) -> BoxedObserver<Item>;
}

impl<Item, O> IntoBoxedObserver<Item> for O
where
  O: Observer<Item> + Send + 'static,
{
  #[inline]
  fn into_boxed(self) -> BoxedObserver<Item> { Box::new(self) }
}

/// Option observer - None ignores all values, Some delegates to inner
impl<O, Item> Observer<Item> for Option<O>
where
  O: Observer<Item>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }
}
