#![forbid(unsafe_code)]

//! Canonical snapshots, structural validation, and state hashing.

use std::collections::{BTreeMap, BTreeSet};

use pagekit_core::BlockCatalog;
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId, Parent};
use crate::error::{BlockStoreError, InvariantViolation};
use crate::store::BlockStore;

/// Current block tree schema version.
pub const BLOCK_TREE_SCHEMA_VERSION: u16 = 1;

/// One parent's ordered child list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingList {
    pub parent: Parent,
    pub children: Vec<BlockId>,
}

/// Serializable picture of a whole store.
///
/// Blocks are sorted by id and sibling lists by parent, so equal stores
/// produce byte-identical serializations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTreeSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub next_id: BlockId,
    #[serde(default)]
    pub revision: u64,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub siblings: Vec<SiblingList>,
}

fn default_schema_version() -> u16 {
    BLOCK_TREE_SCHEMA_VERSION
}

impl BlockTreeSnapshot {
    /// Hash of the visible document, see [`BlockStore::state_hash`].
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        visible_state_hash(
            self.blocks.iter(),
            self.siblings
                .iter()
                .map(|list| (&list.parent, list.children.as_slice())),
        )
    }
}

impl BlockStore {
    /// Canonical snapshot of every record, archived ones included.
    #[must_use]
    pub fn snapshot(&self) -> BlockTreeSnapshot {
        BlockTreeSnapshot {
            schema_version: BLOCK_TREE_SCHEMA_VERSION,
            next_id: self.next_id,
            revision: self.revision,
            blocks: self.blocks.values().cloned().collect(),
            siblings: self
                .siblings
                .iter()
                .map(|(parent, children)| SiblingList {
                    parent: *parent,
                    children: children.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a store from a snapshot, rejecting anything malformed.
    pub fn from_snapshot(
        snapshot: BlockTreeSnapshot,
        catalog: BlockCatalog,
    ) -> Result<Self, BlockStoreError> {
        if snapshot.schema_version != BLOCK_TREE_SCHEMA_VERSION {
            return Err(InvariantViolation::UnsupportedSchemaVersion {
                version: snapshot.schema_version,
            }
            .into());
        }
        let mut blocks = BTreeMap::new();
        for block in snapshot.blocks {
            let id = block.id;
            if blocks.insert(id, block).is_some() {
                return Err(InvariantViolation::DuplicateBlockId { block: id }.into());
            }
        }
        let mut siblings = BTreeMap::new();
        for list in snapshot.siblings {
            if list.children.is_empty() {
                continue;
            }
            if siblings.insert(list.parent, list.children).is_some() {
                return Err(InvariantViolation::DuplicateSiblingList {
                    parent: list.parent,
                }
                .into());
            }
        }
        let store = Self::from_parts(
            catalog,
            blocks,
            siblings,
            snapshot.next_id,
            snapshot.revision,
        );
        store.validate()?;
        Ok(store)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for (id, block) in &self.blocks {
            if *id >= self.next_id {
                return Err(InvariantViolation::IdNotBelowAllocator {
                    block: *id,
                    next_id: self.next_id,
                });
            }
            if !self.catalog.contains(&block.block_type) {
                return Err(InvariantViolation::UnknownBlockType {
                    block: *id,
                    block_type: block.block_type.clone(),
                });
            }
            let Some(parent_id) = block.parent else {
                continue;
            };
            let Some(parent) = self.blocks.get(&parent_id) else {
                return Err(InvariantViolation::DanglingParent {
                    block: *id,
                    parent: parent_id,
                });
            };
            if parent.scope != block.scope {
                return Err(InvariantViolation::ScopeMismatch {
                    block: *id,
                    parent: parent_id,
                });
            }
            if !self.catalog.is_container(&parent.block_type) {
                return Err(InvariantViolation::LeafParent {
                    block: *id,
                    parent: parent_id,
                });
            }
        }

        // Parent chains must terminate within `len` steps.
        for id in self.blocks.keys() {
            let mut cursor = self.blocks.get(id).and_then(|block| block.parent);
            let mut steps = 0usize;
            while let Some(current) = cursor {
                if current == *id || steps > self.blocks.len() {
                    return Err(InvariantViolation::CycleDetected { block: *id });
                }
                steps += 1;
                cursor = self.blocks.get(&current).and_then(|block| block.parent);
            }
        }

        let mut listed = BTreeSet::new();
        for (parent, children) in &self.siblings {
            if let Parent::Block(owner) = parent
                && !self.blocks.contains_key(owner)
            {
                return Err(InvariantViolation::DanglingSiblingList { parent: *parent });
            }
            for child in children {
                let Some(block) = self.blocks.get(child) else {
                    return Err(InvariantViolation::UnknownSiblingEntry {
                        parent: *parent,
                        block: *child,
                    });
                };
                if block.archived {
                    return Err(InvariantViolation::ArchivedInSiblings {
                        parent: *parent,
                        block: *child,
                    });
                }
                if block.parent_ref() != *parent {
                    return Err(InvariantViolation::SiblingParentMismatch {
                        parent: *parent,
                        block: *child,
                    });
                }
                if !listed.insert(*child) {
                    return Err(InvariantViolation::DuplicateSibling { block: *child });
                }
            }
        }
        if let Some(missing) = self
            .blocks
            .values()
            .find(|block| !block.archived && !listed.contains(&block.id))
        {
            return Err(InvariantViolation::MissingFromSiblings { block: missing.id });
        }
        Ok(())
    }

    /// Deterministic hash of the visible document: non-archived records and
    /// sibling order. Revision and allocator state are excluded, so applying
    /// an operation and then its inverse returns the original hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        visible_state_hash(
            self.blocks.values(),
            self.siblings
                .iter()
                .map(|(parent, children)| (parent, children.as_slice())),
        )
    }
}

fn visible_state_hash<'a>(
    blocks: impl Iterator<Item = &'a Block>,
    siblings: impl Iterator<Item = (&'a Parent, &'a [BlockId])>,
) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn mix(hash: &mut u64, byte: u8) {
        *hash ^= u64::from(byte);
        *hash = hash.wrapping_mul(PRIME);
    }

    fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
        for byte in bytes {
            mix(hash, *byte);
        }
    }

    fn mix_u64(hash: &mut u64, value: u64) {
        mix_bytes(hash, &value.to_le_bytes());
    }

    fn mix_str(hash: &mut u64, value: &str) {
        mix_u64(hash, value.len() as u64);
        mix_bytes(hash, value.as_bytes());
    }

    fn mix_opt_str(hash: &mut u64, value: Option<&str>) {
        match value {
            Some(value) => {
                mix(hash, 1);
                mix_str(hash, value);
            }
            None => mix(hash, 0),
        }
    }

    fn mix_map(hash: &mut u64, map: &BTreeMap<String, String>) {
        mix_u64(hash, map.len() as u64);
        for (key, value) in map {
            mix_str(hash, key);
            mix_str(hash, value);
        }
    }

    fn mix_parent(hash: &mut u64, parent: Parent) {
        match parent {
            Parent::Root(scope) => {
                mix(hash, 0);
                mix_u64(hash, u64::from(scope.get()));
            }
            Parent::Block(id) => {
                mix(hash, 1);
                mix_u64(hash, id.get());
            }
        }
    }

    let mut hash = OFFSET_BASIS;
    for block in blocks.filter(|block| !block.archived) {
        mix_u64(&mut hash, block.id.get());
        mix_str(&mut hash, &block.block_type);
        mix_parent(&mut hash, block.parent_ref());
        mix_opt_str(&mut hash, block.name.as_deref());
        mix_map(&mut hash, &block.properties);
        mix_map(&mut hash, &block.styles);
        mix_opt_str(&mut hash, block.component_id.as_deref());
    }
    mix(&mut hash, 0xff);
    for (parent, children) in siblings {
        mix_parent(&mut hash, *parent);
        mix_u64(&mut hash, children.len() as u64);
        for child in children {
            mix_u64(&mut hash, child.get());
        }
    }
    hash
}
