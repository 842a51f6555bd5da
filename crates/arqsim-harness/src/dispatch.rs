//! Delivery of one endpoint's captured output to its peer.

use arqsim_core::Engine;

use crate::{config::AckFlush, endpoint::Endpoint, error::HarnessError, outbox::Outbox};

/// Run one dispatch round from `from` to `to` at time `now`.
///
/// 1. `from.update(now)`, which may emit retransmissions and probes
/// 2. Every segment buffered on `from` is fed to `to`, in capture order
/// 3. `from`'s buffer ends up empty
/// 4. If `to` now owes acks, it flushes them per `ack_flush`
///
/// Returns the number of segments delivered. A segment `to` rejects aborts
/// the round with [`HarnessError::Input`]; the remaining batch is discarded.
pub fn dispatch<E: Engine<Sink = Outbox>>(
    from: &mut Endpoint<E>,
    to: &mut Endpoint<E>,
    now: u32,
    ack_flush: AckFlush,
) -> Result<usize, HarnessError> {
    from.update(now);
    from.check_overflow()?;

    let batch = from.outbox_mut().take_segments();
    let delivered = batch.len();

    for segment in batch {
        to.input(&segment)?;
        if ack_flush == AckFlush::PerSegment && to.pending_acks() > 0 {
            to.flush();
        }
    }
    if ack_flush == AckFlush::Batched && to.pending_acks() > 0 {
        to.flush();
    }
    to.check_overflow()?;

    if delivered > 0 {
        tracing::trace!(from = %from.side(), to = %to.side(), now, delivered, "dispatched");
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use arqsim_core::NoDelayConfig;

    use super::*;
    use crate::{
        config::EndpointConfig,
        endpoint::{SimEndpoint, Side},
    };

    fn pair(config: &EndpointConfig) -> (SimEndpoint, SimEndpoint) {
        let a = SimEndpoint::from_config(Side::A, 1, config).unwrap();
        let b = SimEndpoint::from_config(Side::B, 1, config).unwrap();
        (a, b)
    }

    #[test]
    fn empties_sender_and_acks_once_when_batched() {
        let config =
            EndpointConfig { nodelay: NoDelayConfig::turbo(), ..EndpointConfig::default() };
        let (mut a, mut b) = pair(&config);
        for _ in 0..3 {
            a.send(b"x").unwrap();
        }
        assert_eq!(a.outbox().buffer().len(), 3);

        let delivered = dispatch(&mut a, &mut b, 0, AckFlush::Batched).unwrap();
        assert_eq!(delivered, 3);
        assert!(a.outbox().buffer().is_empty());
        assert_eq!(b.pending_acks(), 0);
        // three acks fit one datagram
        assert_eq!(b.outbox().buffer().len(), 1);
    }

    #[test]
    fn per_segment_flush_acks_each_delivery() {
        let config =
            EndpointConfig { nodelay: NoDelayConfig::turbo(), ..EndpointConfig::default() };
        let (mut a, mut b) = pair(&config);
        for _ in 0..3 {
            a.send(b"x").unwrap();
        }

        dispatch(&mut a, &mut b, 0, AckFlush::PerSegment).unwrap();
        assert_eq!(b.outbox().buffer().len(), 3);
    }

    #[test]
    fn rejected_segment_is_fatal() {
        let (mut a, _) = pair(&EndpointConfig::default());
        let mut stranger =
            SimEndpoint::from_config(Side::B, 2, &EndpointConfig::default()).unwrap();
        a.send(b"wrong conversation").unwrap();

        let err = dispatch(&mut a, &mut stranger, 0, AckFlush::Batched).unwrap_err();
        assert!(matches!(err, HarnessError::Input { side: Side::B, .. }));
        assert!(err.is_protocol_defect());
    }

    #[test]
    fn idle_round_delivers_nothing() {
        let (mut a, mut b) = pair(&EndpointConfig::default());
        assert_eq!(dispatch(&mut a, &mut b, 100, AckFlush::Batched).unwrap(), 0);
        assert!(b.outbox().buffer().is_empty());
    }
}
