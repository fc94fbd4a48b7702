use std::sync::Arc;

use parking_lot::Mutex;
use ream_beacon_chain::{
    notifications::{AttestationEvent, BlockEvent, Subscription},
    service::BeaconChain,
};
use ream_consensus::{attestation::Attestation, beacon_block::SignedBeaconBlock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{detector::SlashingDetector, evidence::SlashingEvidence};

/// Watches the blocks and attestations the chain publishes for slashable behaviour.
pub struct DetectionService {
    chain: Arc<BeaconChain>,
    detector: Mutex<SlashingDetector>,
    evidence: Mutex<Vec<SlashingEvidence>>,
}

impl DetectionService {
    pub fn new(chain: Arc<BeaconChain>) -> Self {
        Self {
            chain,
            detector: Mutex::new(SlashingDetector::default()),
            evidence: Mutex::new(vec![]),
        }
    }

    /// Evidence detected so far, oldest first.
    pub fn evidence(&self) -> Vec<SlashingEvidence> {
        self.evidence.lock().clone()
    }

    /// Subscribes to the chain's feeds and runs detection until ``cancel`` fires or the feeds
    /// close.
    pub async fn run(&self, cancel: CancellationToken) {
        let notifier = self.chain.notifier();
        let (block_sender, block_receiver) = mpsc::unbounded_channel();
        let (attestation_sender, attestation_receiver) = mpsc::unbounded_channel();

        tokio::join!(
            forward(
                notifier.block_feed().subscribe(),
                block_sender,
                cancel.clone(),
                |BlockEvent::ReceivedBlock(block)| block,
            ),
            forward(
                notifier.attestation_feed().subscribe(),
                attestation_sender,
                cancel.clone(),
                |AttestationEvent::Received(attestation)| attestation,
            ),
            self.detect_incoming_blocks(cancel.clone(), block_receiver),
            self.detect_incoming_attestations(cancel.clone(), attestation_receiver),
        );
        info!("Slashing detection stopped");
    }

    pub async fn detect_incoming_blocks(
        &self,
        cancel: CancellationToken,
        mut blocks: mpsc::UnboundedReceiver<Arc<SignedBeaconBlock>>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Context canceled");
                    return;
                }
                block = blocks.recv() => match block {
                    Some(block) => {
                        info!(slot = block.slot(), "Running detection on block");
                        self.detect_block(&block);
                    }
                    None => {
                        debug!("Block channel closed");
                        return;
                    }
                },
            }
        }
    }

    pub async fn detect_incoming_attestations(
        &self,
        cancel: CancellationToken,
        mut attestations: mpsc::UnboundedReceiver<Arc<Attestation>>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Context canceled");
                    return;
                }
                attestation = attestations.recv() => match attestation {
                    Some(attestation) => {
                        info!(
                            slot = attestation.data.slot,
                            participants = attestation.set_positions().count(),
                            "Running detection on attestation"
                        );
                        self.detect_attestation(&attestation);
                    }
                    None => {
                        debug!("Attestation channel closed");
                        return;
                    }
                },
            }
        }
    }

    fn detect_block(&self, block: &SignedBeaconBlock) {
        let finalized_epoch = self.chain.finalized_checkpoint().epoch;
        let evidence = {
            let mut detector = self.detector.lock();
            detector.prune(finalized_epoch);
            detector.check_block(block)
        };
        self.record(evidence);
    }

    fn detect_attestation(&self, attestation: &Attestation) {
        let Some(head_state) = self.chain.head_state() else {
            debug!("No head state to index attestation against, skipping");
            return;
        };
        let indices = match head_state
            .get_attesting_indices(&attestation.data, &attestation.aggregation_bits)
        {
            Ok(indices) => indices,
            Err(err) => {
                warn!(slot = attestation.data.slot, "Could not index attestation: {err:#}");
                return;
            }
        };
        let evidence = self
            .detector
            .lock()
            .check_attestation(&indices, &attestation.data);
        self.record(evidence);
    }

    fn record(&self, evidence: impl IntoIterator<Item = SlashingEvidence>) {
        let mut recorded = self.evidence.lock();
        for evidence in evidence {
            warn!(offender = evidence.offender(), ?evidence, "Detected slashable offence");
            recorded.push(evidence);
        }
    }
}

/// Moves events from a feed into an unbounded channel so a slow detector never drops them.
async fn forward<E, T>(
    mut subscription: Subscription<E>,
    sender: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
    extract: impl Fn(E) -> T,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            event = subscription.recv() => match event {
                Some(event) => {
                    if sender.send(extract(event)).is_err() {
                        return;
                    }
                }
                None => return,
            },
        }
    }
}
