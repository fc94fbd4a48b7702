use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use alloy_primitives::B256;
use ream_beacon_chain::{
    config::ChainConfig,
    error::{ChainError, CheckpointKind},
    notifications::{BlockEvent, Notifier, StateEvent},
    service::{BeaconChain, ChainStartData},
};
use ream_consensus::{
    beacon_block::{BeaconBlock, SignedBeaconBlock},
    beacon_block_body::BeaconBlockBody,
    beacon_state::BeaconState,
    checkpoint::Checkpoint,
    constants::SLOTS_PER_EPOCH,
    interop::{build_block, full_attestation, interop_genesis_state, interop_pubkey},
    signature::BlsSignature,
};
use ream_fork_choice::proto_array::ProtoArrayForkChoice;
use ream_storage::{db::BeaconDB, in_memory::InMemoryDB};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const GENESIS_TIME: u64 = 1_606_824_000;
const VALIDATOR_COUNT: u64 = 64;

fn new_chain(db: Arc<InMemoryDB>, config: ChainConfig) -> BeaconChain {
    BeaconChain::new(
        db,
        Box::new(ProtoArrayForkChoice::new(0, 0, B256::ZERO)),
        Arc::new(Notifier::default()),
        config,
    )
}

fn genesis_state() -> BeaconState {
    interop_genesis_state(GENESIS_TIME, VALIDATOR_COUNT).unwrap()
}

async fn started_chain(config: ChainConfig) -> (Arc<InMemoryDB>, BeaconChain) {
    let db = Arc::new(InMemoryDB::new());
    let chain = new_chain(db.clone(), config);
    let state = genesis_state();
    chain
        .initialize_beacon_chain(GENESIS_TIME, state.clone(), state.eth1_data.clone())
        .await
        .unwrap();
    (db, chain)
}

/// Feeds the chain one block per slot, each carrying a full attestation for its parent. Returns
/// the block root and post-state of every slot, genesis included.
async fn extend_chain(chain: &BeaconChain, slots: u64) -> Vec<(B256, BeaconState)> {
    let genesis_root = chain.genesis_root().unwrap();
    let mut history = vec![(genesis_root, chain.head_state().unwrap().as_ref().clone())];
    for slot in 1..=slots {
        let (parent_root, parent_state) = history.last().unwrap();
        let body = BeaconBlockBody {
            attestations: vec![full_attestation(parent_state, *parent_root).unwrap()].into(),
            ..BeaconBlockBody::default()
        };
        let (block, post_state) = build_block(parent_state, slot, body).unwrap();
        let root = chain
            .receive_block(block, &CancellationToken::new())
            .await
            .unwrap();
        history.push((root, post_state));
    }
    history
}

fn stub_block(slot: u64, parent_root: B256) -> SignedBeaconBlock {
    SignedBeaconBlock {
        message: BeaconBlock {
            slot,
            proposer_index: 0,
            parent_root,
            state_root: B256::ZERO,
            body: BeaconBlockBody::default(),
        },
        signature: BlsSignature::default(),
    }
}

/// Persists a linear chain of stub blocks for slots ``0..=last_slot``, each with a state.
fn save_stub_chain(db: &InMemoryDB, last_slot: u64) -> Vec<B256> {
    let mut state = interop_genesis_state(GENESIS_TIME, 8).unwrap();
    let mut roots = vec![];
    let mut parent_root = B256::ZERO;
    for slot in 0..=last_slot {
        state.slot = slot;
        let root = db.save_block(&stub_block(slot, parent_root)).unwrap();
        db.save_state(&state, root).unwrap();
        roots.push(root);
        parent_root = root;
    }
    roots
}

#[tokio::test]
#[traced_test]
async fn test_start_uninitialized_waits_for_chain_start() {
    let db = Arc::new(InMemoryDB::new());
    let chain = new_chain(db.clone(), ChainConfig::default());
    let mut state_events = chain.notifier().state_feed().subscribe();
    let state = genesis_state();
    let eth1_data = state.eth1_data.clone();

    chain
        .start(async move {
            Ok(ChainStartData {
                genesis_time: GENESIS_TIME,
                genesis_state: state,
                eth1_data,
            })
        })
        .await
        .unwrap();

    assert!(logs_contain("Waiting"));
    assert!(logs_contain("Initialized beacon chain genesis state"));
    assert!(matches!(
        state_events.recv().await,
        Some(StateEvent::ChainStarted { start_time: GENESIS_TIME })
    ));
    assert!(matches!(
        state_events.recv().await,
        Some(StateEvent::Initialized {
            start_time: GENESIS_TIME,
            state_slot: 0
        })
    ));

    for index in 0..VALIDATOR_COUNT {
        assert_eq!(
            db.validator_index(&interop_pubkey(index)).unwrap(),
            Some(index)
        );
    }
    assert_eq!(db.genesis_block_root().unwrap(), chain.genesis_root());
    assert_eq!(db.head_block_root().unwrap(), chain.head_root());
    assert_eq!(chain.head_slot(), 0);
}

#[tokio::test]
#[traced_test]
async fn test_start_initialized_resumes_from_storage() {
    let (db, first) = started_chain(ChainConfig::default()).await;

    let chain = new_chain(db, ChainConfig::default());
    chain
        .start(std::future::pending::<anyhow::Result<ChainStartData>>())
        .await
        .unwrap();

    assert!(logs_contain("data already exists"));
    assert_eq!(chain.genesis_root(), first.genesis_root());
    assert_eq!(chain.genesis_time(), Some(GENESIS_TIME));
    assert_eq!(chain.head_root(), first.head_root());
}

#[tokio::test]
async fn test_start_stopped_before_chain_start() {
    let chain = new_chain(Arc::new(InMemoryDB::new()), ChainConfig::default());
    chain.stop();

    let result = chain
        .start(std::future::pending::<anyhow::Result<ChainStartData>>())
        .await;
    assert!(matches!(result, Err(ChainError::Cancelled)));
    assert!(chain.shutdown_token().is_cancelled());
}

#[tokio::test]
async fn test_initialize_beacon_chain_twice_fails() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let state = genesis_state();

    let result = chain
        .initialize_beacon_chain(GENESIS_TIME, state.clone(), state.eth1_data.clone())
        .await;
    assert!(matches!(result, Err(ChainError::ChainStart(_))));
}

#[test]
fn test_initialize_chain_info_without_genesis() {
    let chain = new_chain(Arc::new(InMemoryDB::new()), ChainConfig::default());

    assert!(matches!(
        chain.initialize_chain_info(),
        Err(ChainError::UninitializedChain(_))
    ));
    assert!(chain.head().is_none());
}

#[tokio::test]
async fn test_full_participation_finalizes_and_prunes() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let mut blocks = chain.notifier().block_feed().subscribe();

    let history = extend_chain(&chain, 4 * SLOTS_PER_EPOCH).await;

    let (head_root, head_state) = history.last().unwrap();
    assert_eq!(chain.head_root(), Some(*head_root));
    assert_eq!(chain.head_slot(), 4 * SLOTS_PER_EPOCH);
    assert_eq!(chain.head_state().unwrap().as_ref(), head_state);
    assert_eq!(db.head_block_root().unwrap(), Some(*head_root));

    let finalized = chain.finalized_checkpoint();
    assert_eq!(finalized, Checkpoint::new(2, history[16].0));
    assert_eq!(
        chain.current_justified_checkpoint(),
        Checkpoint::new(3, history[24].0)
    );
    assert_eq!(chain.previous_justified_checkpoint().epoch, 2);
    assert_eq!(db.finalized_checkpoint().unwrap(), Some(finalized));

    // States more than an epoch below the finalized epoch are gone
    for (root, _) in &history[1..8] {
        assert!(!db.has_state(root));
        assert!(db.has_block(root));
    }
    for (root, _) in &history[8..] {
        assert!(db.has_state(root));
    }
    assert!(db.has_state(&history[0].0));

    for (root, _) in &history[1..] {
        match blocks.try_recv() {
            Some(BlockEvent::ReceivedBlock(block)) => assert_eq!(block.block_root(), *root),
            None => panic!("missing block event"),
        }
    }
}

#[tokio::test]
async fn test_state_pruning_can_be_disabled() {
    let config = ChainConfig {
        prune_finalized_states: false,
        ..ChainConfig::default()
    };
    let (db, chain) = started_chain(config).await;

    let history = extend_chain(&chain, 4 * SLOTS_PER_EPOCH).await;

    assert_eq!(chain.finalized_checkpoint().epoch, 2);
    assert!(history.iter().all(|(root, _)| db.has_state(root)));
}

#[tokio::test]
async fn test_restart_restores_chain_info() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let history = extend_chain(&chain, 4 * SLOTS_PER_EPOCH).await;

    let restarted = new_chain(db, ChainConfig::default());
    restarted.initialize_chain_info().unwrap();

    assert_eq!(restarted.head_root(), chain.head_root());
    assert_eq!(restarted.head_block(), chain.head_block());
    assert_eq!(restarted.head_state(), chain.head_state());
    assert_eq!(restarted.genesis_root(), chain.genesis_root());
    assert_eq!(restarted.finalized_checkpoint(), chain.finalized_checkpoint());
    assert_eq!(
        restarted.current_justified_checkpoint(),
        chain.current_justified_checkpoint()
    );
    // Blocks from the finalized block up to the head are replayed into the graph
    assert_eq!(restarted.fork_choice_node_count(), history.len() - 16);
    assert_eq!(restarted.update_head().unwrap(), history.last().unwrap().0);
}

#[test]
fn test_initialize_chain_info_with_missing_head_block_or_state() {
    let db = Arc::new(InMemoryDB::new());
    let roots = save_stub_chain(&db, 3);
    db.save_genesis_block_root(roots[0]).unwrap();
    db.save_head_block_root(roots[3]).unwrap();
    let chain = new_chain(db.clone(), ChainConfig::default());

    db.delete_state(&roots[3]).unwrap();
    let err = chain.initialize_chain_info().unwrap_err();
    assert!(matches!(err, ChainError::MissingState(root) if root == roots[3]));
    assert!(err.is_consistency_fault());

    db.delete_block(&roots[3]).unwrap();
    let err = chain.initialize_chain_info().unwrap_err();
    assert!(matches!(err, ChainError::MissingBlock(root) if root == roots[3]));
    assert!(err.is_consistency_fault());
    assert_eq!(chain.head_root(), None);
}

#[tokio::test]
async fn test_restart_keeps_stored_fork_extendable() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let genesis = genesis_state();
    let cancel = CancellationToken::new();
    let mut forks = vec![];
    for graffiti in [1, 2] {
        let body = BeaconBlockBody {
            graffiti: B256::repeat_byte(graffiti),
            ..BeaconBlockBody::default()
        };
        let (block, state) = build_block(&genesis, 1, body).unwrap();
        chain.receive_block(block.clone(), &cancel).await.unwrap();
        forks.push((block, state));
    }

    let restarted = new_chain(db, ChainConfig::default());
    restarted.initialize_chain_info().unwrap();
    assert_eq!(restarted.fork_choice_node_count(), 2);
    let head_root = restarted.head_root().unwrap();
    let (fork_block, fork_state) = forks
        .into_iter()
        .find(|(block, _)| block.block_root() != head_root)
        .unwrap();

    // The stored but unreplayed fork block goes back into the graph
    let fork_root = restarted.receive_block(fork_block, &cancel).await.unwrap();
    assert_eq!(restarted.fork_choice_node_count(), 3);

    let (child, _) = build_block(&fork_state, 2, BeaconBlockBody::default()).unwrap();
    assert_eq!(child.parent_root(), fork_root);
    restarted.receive_block(child, &cancel).await.unwrap();
    assert_eq!(restarted.fork_choice_node_count(), 4);
}

#[tokio::test]
async fn test_receive_block_skipping_too_many_slots() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let block = stub_block(20_000, chain.genesis_root().unwrap());

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        chain.receive_block(block.clone(), &CancellationToken::new()),
    )
    .await
    .unwrap();
    assert!(matches!(
        result,
        Err(ChainError::TooManySkippedSlots {
            slot: 20_000,
            parent_slot: 0
        })
    ));
    assert!(!db.has_block(&block.block_root()));
}

#[tokio::test]
async fn test_receive_block_from_the_future() {
    let db = Arc::new(InMemoryDB::new());
    let chain = new_chain(db.clone(), ChainConfig::default());
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let state = interop_genesis_state(now, VALIDATOR_COUNT).unwrap();
    chain
        .initialize_beacon_chain(now, state.clone(), state.eth1_data.clone())
        .await
        .unwrap();

    let block = stub_block(100, chain.genesis_root().unwrap());
    let result = chain
        .receive_block(block.clone(), &CancellationToken::new())
        .await;
    assert!(matches!(
        result,
        Err(ChainError::FutureBlock { slot: 100, .. })
    ));
    assert!(!db.has_block(&block.block_root()));
}

#[tokio::test]
async fn test_cancel_interrupts_long_state_transition() {
    let config = ChainConfig {
        max_skip_slots: u64::MAX,
        ..ChainConfig::default()
    };
    let (db, chain) = started_chain(config).await;
    let block = stub_block(20_000, chain.genesis_root().unwrap());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        chain.receive_block(block.clone(), &cancel),
    )
    .await
    .unwrap();
    assert!(matches!(result, Err(ChainError::Cancelled)));
    assert!(!db.has_block(&block.block_root()));
    assert_eq!(chain.fork_choice_node_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chain_head_pairs_checkpoints_with_their_head() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let chain = Arc::new(chain);
    let done = Arc::new(AtomicBool::new(false));
    let reader = tokio::spawn({
        let chain = chain.clone();
        let done = done.clone();
        async move {
            let mut snapshots = vec![];
            while !done.load(Ordering::Acquire) {
                snapshots.push(chain.chain_head_retrieval().unwrap());
                tokio::task::yield_now().await;
            }
            snapshots
        }
    });

    let history = extend_chain(&chain, 4 * SLOTS_PER_EPOCH).await;
    done.store(true, Ordering::Release);
    let snapshots = reader.await.unwrap();

    assert!(!snapshots.is_empty());
    for snapshot in snapshots {
        let (head_root, head_state) = &history[snapshot.head_slot as usize];
        assert_eq!(snapshot.head_block_root, *head_root);
        assert_eq!(
            snapshot.finalized_epoch,
            head_state.finalized_checkpoint.epoch
        );
        assert_eq!(
            snapshot.justified_epoch,
            head_state.current_justified_checkpoint.epoch
        );
    }
}

#[tokio::test]
async fn test_receive_known_block_is_noop() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let (block, _) = build_block(&genesis_state(), 1, BeaconBlockBody::default()).unwrap();
    let cancel = CancellationToken::new();

    let root = chain.receive_block(block.clone(), &cancel).await.unwrap();
    assert_eq!(chain.receive_block(block, &cancel).await.unwrap(), root);
    assert_eq!(chain.fork_choice_node_count(), 2);
}

#[tokio::test]
async fn test_receive_orphan_block() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let block = stub_block(3, B256::repeat_byte(7));

    let result = chain
        .receive_block(block.clone(), &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ChainError::OrphanBlock { .. })));
    assert!(!db.has_block(&block.block_root()));
    assert_eq!(chain.fork_choice_node_count(), 1);
}

#[tokio::test]
async fn test_receive_block_with_bad_state_root() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let (mut block, _) = build_block(&genesis_state(), 1, BeaconBlockBody::default()).unwrap();
    block.message.state_root = B256::repeat_byte(1);

    let result = chain
        .receive_block(block.clone(), &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ChainError::StateTransition(_))));
    assert!(!db.has_block(&block.block_root()));
    assert_eq!(chain.head_slot(), 0);
}

#[tokio::test]
async fn test_receive_block_cancelled_before_commit() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let mut blocks = chain.notifier().block_feed().subscribe();
    let (block, _) = build_block(&genesis_state(), 1, BeaconBlockBody::default()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = chain.receive_block(block.clone(), &cancel).await;
    assert!(matches!(result, Err(ChainError::Cancelled)));
    assert!(!db.has_block(&block.block_root()));
    assert!(!chain.has_block(&block.block_root()));
    assert!(blocks.try_recv().is_none());
}

#[tokio::test]
async fn test_receive_block_before_finalized_slot() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let history = extend_chain(&chain, 4 * SLOTS_PER_EPOCH).await;

    // Sibling of the canonical slot 10 block
    let (block, _) = build_block(&history[9].1, 10, BeaconBlockBody::default()).unwrap();
    let result = chain.receive_block(block, &CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(ChainError::BlockBeforeFinalized {
            slot: 10,
            finalized_slot: 16
        })
    ));
}

#[tokio::test]
async fn test_insert_block_twice() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let (block, state) = build_block(&genesis_state(), 1, BeaconBlockBody::default()).unwrap();
    let root = block.block_root();

    chain
        .insert_block_to_fork_choice_store(&block.message, root, &state)
        .unwrap();
    chain
        .insert_block_to_fork_choice_store(&block.message, root, &state)
        .unwrap();
    assert_eq!(chain.fork_choice_node_count(), 2);
}

#[tokio::test]
async fn test_insert_orphan_block() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let block = stub_block(4, B256::repeat_byte(9));

    let result = chain.insert_block_to_fork_choice_store(
        &block.message,
        block.block_root(),
        &genesis_state(),
    );
    assert!(matches!(result, Err(ChainError::OrphanBlock { .. })));
    assert_eq!(chain.fork_choice_node_count(), 1);
}

#[tokio::test]
async fn test_has_block_checks_fork_choice_and_storage() {
    let (db, chain) = started_chain(ChainConfig::default()).await;
    let genesis_root = chain.genesis_root().unwrap();

    let stored_only = stub_block(5, B256::repeat_byte(5));
    let stored_root = db.save_block(&stored_only).unwrap();

    let graph_only = stub_block(6, genesis_root);
    let graph_root = graph_only.block_root();
    chain
        .insert_block_to_fork_choice_store(&graph_only.message, graph_root, &genesis_state())
        .unwrap();

    assert!(chain.has_block(&stored_root));
    assert!(chain.has_block(&graph_root));
    assert!(!db.has_block(&graph_root));
    assert!(!chain.has_block(&B256::repeat_byte(0xee)));
}

#[test]
fn test_prune_garbage_state() {
    let db = Arc::new(InMemoryDB::new());
    let roots = save_stub_chain(&db, 100);
    let chain = new_chain(db.clone(), ChainConfig::default());

    assert_eq!(chain.prune_garbage_state(50).unwrap(), 49);

    for root in &roots[1..50] {
        assert!(!db.has_state(root));
    }
    for root in &roots[50..] {
        assert!(db.has_state(root));
    }
    assert!(db.has_state(&roots[0]));
}

#[test]
fn test_prune_garbage_state_keeps_head_and_checkpoints() {
    let db = Arc::new(InMemoryDB::new());
    let roots = save_stub_chain(&db, 100);
    db.save_genesis_block_root(roots[0]).unwrap();
    db.save_head_block_root(roots[20]).unwrap();
    db.save_finalized_checkpoint(Checkpoint::new(1, roots[8])).unwrap();
    db.save_justified_checkpoint(Checkpoint::new(2, roots[16])).unwrap();

    let chain = new_chain(db.clone(), ChainConfig::default());
    chain.initialize_chain_info().unwrap();
    assert_eq!(chain.head_slot(), 20);

    assert_eq!(chain.prune_garbage_state(50).unwrap(), 46);
    for (slot, root) in roots.iter().enumerate().take(50) {
        let kept = [0, 8, 16, 20].contains(&slot);
        assert_eq!(db.has_state(root), kept, "slot {slot}");
    }
}

#[test]
fn test_chain_head_retrieval() {
    let db = Arc::new(InMemoryDB::new());
    let roots = save_stub_chain(&db, 10);
    db.save_genesis_block_root(roots[0]).unwrap();
    db.save_head_block_root(roots[10]).unwrap();
    db.save_finalized_checkpoint(Checkpoint::new(2, roots[4])).unwrap();
    db.save_justified_checkpoint(Checkpoint::new(3, roots[6])).unwrap();

    let chain = new_chain(db.clone(), ChainConfig::default());
    chain.initialize_chain_info().unwrap();

    let chain_head = chain.chain_head_retrieval().unwrap();
    assert_eq!(chain_head.head_slot, 10);
    assert_eq!(chain_head.head_epoch, 1);
    assert_eq!(chain_head.head_block_root, roots[10]);
    assert_eq!(chain_head.finalized_slot, 4);
    assert_eq!(chain_head.finalized_epoch, 2);
    assert_eq!(chain_head.finalized_block_root, roots[4]);
    assert_eq!(chain_head.justified_slot, 6);
    assert_eq!(chain_head.justified_epoch, 3);
    assert_eq!(chain_head.justified_block_root, roots[6]);
    assert_eq!(chain_head.previous_justified_slot, 6);
    assert_eq!(chain_head.previous_justified_epoch, 3);

    db.delete_block(&roots[4]).unwrap();
    let err = chain.chain_head_retrieval().unwrap_err();
    assert!(matches!(
        err,
        ChainError::CheckpointUnresolved {
            kind: CheckpointKind::Finalized,
            ..
        }
    ));
    assert!(err.is_consistency_fault());
}

#[test]
fn test_chain_head_retrieval_without_head() {
    let chain = new_chain(Arc::new(InMemoryDB::new()), ChainConfig::default());

    assert!(matches!(
        chain.chain_head_retrieval(),
        Err(ChainError::HeadUnset)
    ));
}

#[tokio::test]
#[traced_test]
async fn test_attestations_move_head() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let genesis = genesis_state();
    let cancel = CancellationToken::new();

    let (block_a, state_a) = build_block(&genesis, 1, BeaconBlockBody::default()).unwrap();
    let (block_b, state_b) = build_block(&genesis, 2, BeaconBlockBody::default()).unwrap();
    let root_a = chain.receive_block(block_a, &cancel).await.unwrap();
    let root_b = chain.receive_block(block_b, &cancel).await.unwrap();

    let vote_b = full_attestation(&state_b, root_b).unwrap();
    let indices = chain.on_attestation(vote_b, &cancel).unwrap();
    assert_eq!(indices.len() as u64, VALIDATOR_COUNT / SLOTS_PER_EPOCH);
    assert_eq!(chain.update_head().unwrap(), root_b);

    // Two committees outweigh one
    let vote_a = full_attestation(&state_a, root_a).unwrap();
    let mut second_vote_a = vote_a.clone();
    second_vote_a.data.slot = 3;
    chain.on_attestation(vote_a, &cancel).unwrap();
    chain.on_attestation(second_vote_a, &cancel).unwrap();

    assert_eq!(chain.update_head().unwrap(), root_a);
    assert_eq!(chain.head_root(), Some(root_a));
    assert!(logs_contain("Chain reorg occurred"));
}

#[tokio::test]
async fn test_attestation_for_unknown_block() {
    let (_db, chain) = started_chain(ChainConfig::default()).await;
    let mut attestation =
        full_attestation(&genesis_state(), chain.genesis_root().unwrap()).unwrap();
    attestation.data.beacon_block_root = B256::repeat_byte(3);

    let result = chain.on_attestation(attestation, &CancellationToken::new());
    assert!(matches!(result, Err(ChainError::UnknownBlockRoot(_))));
}
