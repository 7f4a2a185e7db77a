//! # rxmux: reference-counted multicasting for hot sources
//!
//! Share one expensive producer, such as a platform listener or a sensor
//! callback, among any number of consumers. The producer is activated when
//! the first consumer subscribes and deactivated when the last one leaves.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicBool, Ordering},
//!   Arc,
//! };
//!
//! use rxmux::prelude::*;
//!
//! let online = Arc::new(AtomicBool::new(true));
//! let c_online = online.clone();
//! let publisher = DistinctCachingPublisher::builder(move || c_online.load(Ordering::SeqCst))
//!   .on_activate(|| Ok(println!("listening")))
//!   .on_deactivate(|| Ok(println!("stopped")))
//!   .build();
//!
//! let mut subscription = publisher.subscribe(|online| println!("online: {online}")).unwrap();
//! online.store(false, Ordering::SeqCst);
//! publisher.refresh();
//! subscription.unsubscribe();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SubscriptionMultiplexer`] | Counts subscribers over any hot source and runs first/last hooks |
//! | [`DistinctCachingPublisher`] | Multiplexer over a distinct cache: de-duplicates and replays the latest value |
//! | [`Subject`] / [`DistinctSubject`] | Hot fan-out sources |
//! | [`Observable`] | The trait every source implements |
//! | [`SubscriptionLike`] | Handle to cancel an active subscription |
//!
//! ## Feature Flags
//!
//! - **`network`** (default): network-state repository built on the publisher
//! - **`preference`** (default): preference-change notifications built on the
//!   multiplexer
//!
//! [`SubscriptionMultiplexer`]: multiplexer::SubscriptionMultiplexer
//! [`DistinctCachingPublisher`]: publisher::DistinctCachingPublisher
//! [`Subject`]: subject::Subject
//! [`DistinctSubject`]: subject::DistinctSubject
//! [`Observable`]: observable::Observable
//! [`SubscriptionLike`]: subscription::SubscriptionLike

pub mod error;
pub mod into_stream;
pub mod multiplexer;
#[cfg(feature = "network")]
pub mod network;
pub mod observable;
pub mod observer;
#[cfg(feature = "preference")]
pub mod preference;
pub mod prelude;
pub mod publisher;
pub mod subject;
pub mod subscription;
mod util;

// Re-export the prelude module
pub use prelude::*;
