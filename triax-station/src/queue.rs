//! Per-channel sample queues
//!
//! One bounded crossbeam channel per sensor channel. The acquisition worker
//! is the only producer and never blocks: when a queue is full the new
//! sample is dropped and counted. The main loop is the only consumer and
//! drains everything that has arrived on each update tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use triax_core::constants::acquisition::CHANNEL_COUNT;
use triax_core::Channel;

/// Producer half of one channel's queue
#[derive(Debug, Clone)]
pub struct SampleProducer {
    tx: Sender<f32>,
    dropped: Arc<AtomicU64>,
}

impl SampleProducer {
    /// Offer a sample; returns false if the queue was full and it was dropped
    pub fn push(&self, value: f32) -> bool {
        match self.tx.try_send(value) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Fill level snapshot
    pub fn stats(&self) -> ChannelStats {
        ChannelStats::from_sender(&self.tx, &self.dropped)
    }
}

/// Consumer half of one channel's queue
#[derive(Debug)]
pub struct SampleConsumer {
    rx: Receiver<f32>,
    tx: Sender<f32>,
    dropped: Arc<AtomicU64>,
}

impl SampleConsumer {
    /// Move every queued sample into `out`, returning how many were moved
    ///
    /// `out` is cleared first. Only samples present at the start of the
    /// call are taken, so a fast producer cannot keep the drain going.
    pub fn drain_into(&self, out: &mut Vec<f32>) -> usize {
        out.clear();
        let pending = self.rx.len();
        out.extend(self.rx.try_iter().take(pending));
        out.len()
    }

    /// Samples dropped since the queue was created
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Fill level snapshot
    pub fn stats(&self) -> ChannelStats {
        ChannelStats::from_sender(&self.tx, &self.dropped)
    }
}

/// Create one bounded sample queue
pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let (tx, rx) = bounded(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        SampleProducer { tx: tx.clone(), dropped: Arc::clone(&dropped) },
        SampleConsumer { rx, tx, dropped },
    )
}

/// Producers for every channel, indexed by [`Channel`]
#[derive(Debug, Clone)]
pub struct ProducerSet {
    producers: [SampleProducer; CHANNEL_COUNT],
}

impl ProducerSet {
    /// Producer for a channel
    pub fn get(&self, channel: Channel) -> &SampleProducer {
        &self.producers[channel.index()]
    }
}

/// Consumers for every channel, indexed by [`Channel`]
#[derive(Debug)]
pub struct ConsumerSet {
    consumers: [SampleConsumer; CHANNEL_COUNT],
}

impl ConsumerSet {
    /// Consumer for a channel
    pub fn get(&self, channel: Channel) -> &SampleConsumer {
        &self.consumers[channel.index()]
    }

    /// Total drops over every channel
    pub fn total_dropped(&self) -> u64 {
        self.consumers.iter().map(SampleConsumer::dropped).sum()
    }
}

/// One queue per channel, all with the same capacity
pub fn channel_queues(capacity: usize) -> (ProducerSet, ConsumerSet) {
    let [q0, q1, q2, q3] = [(); CHANNEL_COUNT].map(|_| sample_queue(capacity));
    (
        ProducerSet { producers: [q0.0, q1.0, q2.0, q3.0] },
        ConsumerSet { consumers: [q0.1, q1.1, q2.1, q3.1] },
    )
}

/// Statistics for monitoring queue health
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    /// Queue capacity
    pub capacity: usize,
    /// Samples waiting
    pub len: usize,
    /// Samples dropped since creation
    pub dropped: u64,
}

impl ChannelStats {
    fn from_sender(tx: &Sender<f32>, dropped: &AtomicU64) -> Self {
        Self {
            capacity: tx.capacity().unwrap_or(0),
            len: tx.len(),
            dropped: dropped.load(Ordering::Relaxed),
        }
    }

    /// Fill level from 0.0 to 1.0
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.len as f64 / self.capacity as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_queue_drops_newest() {
        let (tx, rx) = sample_queue(2);
        assert!(tx.push(1.0));
        assert!(tx.push(2.0));
        assert!(!tx.push(3.0));
        assert_eq!(rx.dropped(), 1);

        let mut out = Vec::new();
        assert_eq!(rx.drain_into(&mut out), 2);
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn drain_empties_queue() {
        let (tx, rx) = sample_queue(10);
        for i in 0..5 {
            tx.push(i as f32);
        }
        let mut out = vec![99.0];
        rx.drain_into(&mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(rx.drain_into(&mut out), 0);
        assert!(out.is_empty());
    }

    proptest! {
        #[test]
        fn drain_holds_what_fit_and_counts_the_rest(
            capacity in 1usize..64,
            values in prop::collection::vec(-1.0e3f32..1.0e3, 0..200),
        ) {
            let (tx, rx) = sample_queue(capacity);
            for &v in &values {
                tx.push(v);
            }
            let mut out = Vec::new();
            let drained = rx.drain_into(&mut out);
            prop_assert!(drained <= capacity);
            prop_assert_eq!(drained as u64 + rx.dropped(), values.len() as u64);
            prop_assert_eq!(&out[..], &values[..drained]);
        }
    }

    #[test]
    fn stats_report_fill() {
        let (tx, rx) = sample_queue(4);
        tx.push(1.0);
        let stats = rx.stats();
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.len, 1);
        assert_eq!(stats.utilization(), 0.25);
    }

    #[test]
    fn channel_sets_are_independent() {
        let (producers, consumers) = channel_queues(1);
        producers.get(Channel::TankLoad).push(1.0);
        producers.get(Channel::TankLoad).push(2.0);

        let mut out = Vec::new();
        assert_eq!(consumers.get(Channel::AxialLoad).drain_into(&mut out), 0);
        assert_eq!(consumers.get(Channel::TankLoad).drain_into(&mut out), 1);
        assert_eq!(consumers.total_dropped(), 1);
    }
}
