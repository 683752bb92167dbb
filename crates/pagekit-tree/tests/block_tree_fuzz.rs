//! Property/fuzz-style invariants for block tree mutations.
//!
//! Random operation streams run against the public BlockStore API. After each
//! step the tree must validate, rejected operations must leave no trace, and
//! the recorded change stream must replay and unwind deterministically.

use std::cell::RefCell;
use std::rc::Rc;

use pagekit_core::BlockCatalog;
use pagekit_tree::{
    BlockChange, BlockId, BlockStore, BlockStoreError, ChangeOrigin, NewBlock, Parent, ScopeId,
};
use proptest::prelude::*;

const PAGE: ScopeId = ScopeId::new(1);
const TYPES: &[&str] = &["section", "row", "column", "card", "text", "button", "image"];

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % (bound as u64 + 1)) as usize
    }
}

fn all_ids(store: &BlockStore) -> Vec<BlockId> {
    (1..store.next_id().get())
        .filter_map(|raw| BlockId::new(raw).ok())
        .filter(|id| store.record(*id).is_some())
        .collect()
}

fn random_parent(rng: &mut Lcg, ids: &[BlockId]) -> Parent {
    if ids.is_empty() || rng.choose_index(4) == 0 {
        Parent::Root(PAGE)
    } else {
        Parent::Block(ids[rng.choose_index(ids.len())])
    }
}

fn assert_acyclic(store: &BlockStore) {
    for id in all_ids(store) {
        let mut cursor = store.record(id).and_then(|block| block.parent);
        let mut depth = 0usize;
        while let Some(parent) = cursor {
            assert_ne!(parent, id, "block {id} is its own ancestor");
            depth += 1;
            assert!(depth <= store.len(), "parent chain of {id} does not terminate");
            cursor = store.record(parent).and_then(|block| block.parent);
        }
    }
}

/// Run `steps` random mutations; returns the store and every committed change.
fn run_sequence(seed: u64, steps: usize) -> (BlockStore, Vec<BlockChange>) {
    let mut rng = Lcg::new(seed);
    let mut store = BlockStore::new(BlockCatalog::standard());
    let changes = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&changes);
    let _sub = store.subscribe(move |change, _| log.borrow_mut().push(change.clone()));

    for _ in 0..steps {
        let ids = all_ids(&store);
        let before_hash = store.state_hash();
        let before_revision = store.revision();
        let result: Result<(), BlockStoreError> = match rng.choose_index(6) {
            0 | 1 => {
                let block_type = TYPES[rng.choose_index(TYPES.len())];
                let parent = random_parent(&mut rng, &ids);
                let index = rng.below(6);
                store
                    .insert_block(NewBlock::new(block_type), parent, index)
                    .map(|_| ())
            }
            2 | 3 if !ids.is_empty() => {
                let block = ids[rng.choose_index(ids.len())];
                let parent = random_parent(&mut rng, &ids);
                let index = rng.below(6);
                store.move_block(block, parent, index).map(|_| ())
            }
            4 if !ids.is_empty() => {
                let block = ids[rng.choose_index(ids.len())];
                store.archive_block(block)
            }
            5 if !ids.is_empty() => {
                let block = ids[rng.choose_index(ids.len())];
                store
                    .set_property(block, "text", Some(format!("v{}", rng.below(3)).as_str()))
                    .map(|_| ())
            }
            _ => Ok(()),
        };
        if result.is_err() {
            assert_eq!(store.state_hash(), before_hash, "failed mutation left a trace");
            assert_eq!(store.revision(), before_revision);
        }
        assert_eq!(store.validate(), Ok(()));
    }
    let changes = changes.borrow().clone();
    (store, changes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_mutation_sequences_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..160,
    ) {
        let (store, changes) = run_sequence(seed, steps);
        assert_acyclic(&store);
        prop_assert_eq!(store.revision(), changes.len() as u64);
        for (offset, change) in changes.iter().enumerate() {
            prop_assert_eq!(change.revision, offset as u64 + 1);
        }
    }

    #[test]
    fn change_stream_replays_deterministically(
        seed in any::<u64>(),
        steps in 20usize..100,
    ) {
        let (store, changes) = run_sequence(seed, steps);

        let mut replay = BlockStore::new(BlockCatalog::standard());
        for change in &changes {
            replay
                .apply_operation(change.operation.clone(), ChangeOrigin::Redo)
                .expect("replayed operation should succeed");
            prop_assert_eq!(replay.state_hash(), change.state_hash);
        }
        prop_assert_eq!(replay.snapshot().blocks, store.snapshot().blocks);
        prop_assert_eq!(replay.snapshot().siblings, store.snapshot().siblings);
    }

    #[test]
    fn inverses_unwind_to_empty_document(
        seed in any::<u64>(),
        steps in 20usize..100,
    ) {
        let empty_hash = BlockStore::new(BlockCatalog::standard()).state_hash();
        let (mut store, changes) = run_sequence(seed, steps);
        for change in changes.iter().rev() {
            store
                .apply_operation(change.inverse.clone(), ChangeOrigin::Undo)
                .expect("inverse should apply");
            prop_assert_eq!(store.validate(), Ok(()));
        }
        prop_assert_eq!(store.state_hash(), empty_hash);
    }
}

#[test]
fn moving_into_own_subtree_always_fails() {
    let mut store = BlockStore::new(BlockCatalog::standard());
    let mut chain = Vec::new();
    let mut parent = Parent::Root(PAGE);
    for _ in 0..6 {
        let id = store
            .insert_block(NewBlock::new("column"), parent, 0)
            .expect("insert")
            .id;
        chain.push(id);
        parent = Parent::Block(id);
    }
    for (depth, ancestor) in chain.iter().enumerate() {
        for descendant in &chain[depth..] {
            assert_eq!(
                store.move_block(*ancestor, Parent::Block(*descendant), 0),
                Err(BlockStoreError::Cycle {
                    block: *ancestor,
                    parent: *descendant,
                })
            );
        }
    }
    assert_eq!(store.validate(), Ok(()));
}
