use bencher::{benchmark_group, benchmark_main, Bencher};
use rxmux::prelude::*;

fn subscribe_unsubscribe(b: &mut Bencher) {
  let multiplexer = SubscriptionMultiplexer::with_hooks(Subject::<u32>::new(), || Ok(()), || Ok(()));
  b.iter(|| {
    let mut subscription = multiplexer.subscribe(|_| {}).unwrap();
    subscription.unsubscribe();
  });
}

fn fan_out_to_eight(b: &mut Bencher) {
  let publisher = DistinctCachingPublisher::builder(|| 0_u32).build();
  let _subscriptions: Vec<_> = (0..8)
    .map(|_| {
      publisher
        .subscribe(|v| {
          bencher::black_box(v);
        })
        .unwrap()
    })
    .collect();
  let mut next = 0_u32;
  b.iter(|| {
    next = next.wrapping_add(1);
    publisher.ingest(next)
  });
}

fn suppress_duplicates(b: &mut Bencher) {
  let publisher = DistinctCachingPublisher::builder(|| 7_u32).build();
  let _subscription = publisher.subscribe(|_| {}).unwrap();
  b.iter(|| publisher.ingest(7));
}

benchmark_group!(benches, subscribe_unsubscribe, fan_out_to_eight, suppress_duplicates);
benchmark_main!(benches);
