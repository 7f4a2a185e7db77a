//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  error::{BoxError, Error},
  into_stream::IntoStream,
  multiplexer::{Hook, MultiplexSubscription, SubscriptionMultiplexer},
  observable::Observable,
  observer::{BoxedObserver, FnMutObserver, IntoBoxedObserver, Observer},
  publisher::{DistinctCachingPublisher, Ingestor, PublisherBuilder, ReactivationPolicy},
  subject::{DistinctSubject, Subject, SubjectSubscription},
  subscription::{SubscriptionGuard, SubscriptionLike, SubscriptionWrapper},
};
