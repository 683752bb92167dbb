#![forbid(unsafe_code)]

//! Block identifiers and records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BlockStoreError;

/// Property key holding a text-bearing block's editable content.
pub const TEXT_PROPERTY: &str = "text";

/// Stable identifier for blocks.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(u64);

impl BlockId {
    /// Lowest valid block ID.
    pub const MIN: Self = Self(1);

    /// Create a new block ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, BlockStoreError> {
        if raw == 0 {
            return Err(BlockStoreError::ZeroBlockId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, BlockStoreError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(BlockStoreError::IdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = BlockStoreError;

    /// Parse the decimal form produced by `Display`. Surrounding whitespace
    /// is tolerated because drag markers often arrive with a trailing newline.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<u64>()
            .map_err(|_| BlockStoreError::MalformedBlockId(s.to_owned()))?;
        Self::new(raw)
    }
}

/// A page or reusable component. Each scope owns one root sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Owner of a sibling list: a scope's root level or a container block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Parent {
    Root(ScopeId),
    Block(BlockId),
}

impl Parent {
    /// The parent block, or `None` for root level.
    #[must_use]
    pub const fn block_id(self) -> Option<BlockId> {
        match self {
            Self::Root(_) => None,
            Self::Block(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Root(_))
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(scope) => write!(f, "root of {scope}"),
            Self::Block(id) => write!(f, "block {id}"),
        }
    }
}

/// Where a block sits: its sibling list and index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub parent: Parent,
    pub index: usize,
}

impl Placement {
    #[must_use]
    pub const fn new(parent: Parent, index: usize) -> Self {
        Self { parent, index }
    }
}

/// One node of the edited document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub block_type: String,
    pub scope: ScopeId,
    /// `None` for root-level blocks of `scope`.
    pub parent: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, String>,
    /// Reusable component rendered by an instance block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl Block {
    /// The sibling list this block belongs to.
    #[must_use]
    pub fn parent_ref(&self) -> Parent {
        match self.parent {
            Some(id) => Parent::Block(id),
            None => Parent::Root(self.scope),
        }
    }

    /// Human label, defaulting to the block type.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.block_type)
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn style(&self, key: &str) -> Option<&str> {
        self.styles.get(key).map(String::as_str)
    }

    /// Content of the [`TEXT_PROPERTY`], if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.property(TEXT_PROPERTY)
    }
}

/// Content for a block that does not exist yet.
///
/// The store assigns the id, scope, and parent when the block is inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBlock {
    pub block_type: String,
    pub name: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub component_id: Option<String>,
}

impl NewBlock {
    #[must_use]
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            ..Self::default()
        }
    }

    /// An instance block rendering the reusable component `component_id`.
    #[must_use]
    pub fn instance(instance_type: impl Into<String>, component_id: impl Into<String>) -> Self {
        Self {
            component_id: Some(component_id.into()),
            ..Self::new(instance_type)
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(key.into(), value.into());
        self
    }

    pub(crate) fn into_block(self, id: BlockId, scope: ScopeId, parent: Parent) -> Block {
        Block {
            id,
            block_type: self.block_type,
            scope,
            parent: parent.block_id(),
            name: self.name,
            properties: self.properties,
            styles: self.styles,
            component_id: self.component_id,
            archived: false,
        }
    }
}
