#![forbid(unsafe_code)]

//! Block-type vocabulary.
//!
//! The palette collaborator declares which block types exist and what each
//! one may do. The engine never hardcodes a type name outside
//! [`BlockCatalog::standard`]; container checks, text editing, and component
//! instances are all decided by looking the type up here.

use std::fmt;
use std::sync::LazyLock;

use ahash::AHashMap;
use bitflags::bitflags;
use regex_lite::Regex;

/// Strict block-type name grammar: lowercase kebab-case, starting with a letter.
pub const BLOCK_TYPE_NAME_PATTERN: &str = r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$";

/// Longest accepted block-type name.
pub const BLOCK_TYPE_NAME_MAX_LEN: usize = 64;

static TYPE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BLOCK_TYPE_NAME_PATTERN).expect("block type name pattern"));

/// Check `name` against the block-type name grammar.
///
/// This is the gate for untrusted plain-text drag payloads, so it is strict:
/// no whitespace, no uppercase, no trailing dash.
#[must_use]
pub fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= BLOCK_TYPE_NAME_MAX_LEN && TYPE_NAME_RE.is_match(name)
}

bitflags! {
    /// Capabilities of a block type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockTraits: u8 {
        /// May own child blocks.
        const CONTAINER = 0b0001;
        /// Carries an editable `text` property.
        const TEXT      = 0b0010;
        /// Renders a reusable component by reference.
        const INSTANCE  = 0b0100;
    }
}

impl BlockTraits {
    /// Plain leaf with no extra capabilities.
    pub const LEAF: Self = Self::empty();
}

/// Catalog construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The name does not match [`BLOCK_TYPE_NAME_PATTERN`].
    InvalidTypeName(String),
    /// A container type cannot also be a component instance.
    ConflictingTraits { name: String, traits: BlockTraits },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTypeName(name) => write!(f, "invalid block type name {name:?}"),
            Self::ConflictingTraits { name, traits } => {
                write!(f, "block type {name:?} has conflicting traits {traits:?}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// The set of block types an editor instance understands.
#[derive(Debug, Clone, Default)]
pub struct BlockCatalog {
    entries: AHashMap<String, BlockTraits>,
    instance_type: Option<String>,
}

impl BlockCatalog {
    /// Empty catalog. Every lookup fails until types are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock vocabulary shipped with the editor palette.
    #[must_use]
    pub fn standard() -> Self {
        const CONTAINERS: &[&str] = &[
            "section", "container", "row", "column", "grid", "form", "list", "card",
        ];
        const TEXT_LEAVES: &[&str] = &["text", "heading", "paragraph", "button", "link", "label"];
        const LEAVES: &[&str] = &[
            "image", "input", "textarea", "video", "icon", "divider", "spacer",
        ];

        let mut entries = AHashMap::with_capacity(CONTAINERS.len() + TEXT_LEAVES.len() + 8);
        for name in CONTAINERS {
            entries.insert((*name).to_owned(), BlockTraits::CONTAINER);
        }
        for name in TEXT_LEAVES {
            entries.insert((*name).to_owned(), BlockTraits::TEXT);
        }
        for name in LEAVES {
            entries.insert((*name).to_owned(), BlockTraits::LEAF);
        }
        entries.insert("component-instance".to_owned(), BlockTraits::INSTANCE);
        Self {
            entries,
            instance_type: Some("component-instance".to_owned()),
        }
    }

    /// Register (or redefine) a block type.
    ///
    /// Registering an [`BlockTraits::INSTANCE`] type makes it the type used for
    /// blocks created from reusable components.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        traits: BlockTraits,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if !is_valid_type_name(&name) {
            return Err(CatalogError::InvalidTypeName(name));
        }
        if traits.contains(BlockTraits::CONTAINER | BlockTraits::INSTANCE) {
            return Err(CatalogError::ConflictingTraits { name, traits });
        }
        if traits.contains(BlockTraits::INSTANCE) {
            self.instance_type = Some(name.clone());
        } else if self.instance_type.as_deref() == Some(name.as_str()) {
            self.instance_type = None;
        }
        self.entries.insert(name, traits);
        Ok(())
    }

    /// Builder form of [`Self::register`].
    pub fn with_type(
        mut self,
        name: impl Into<String>,
        traits: BlockTraits,
    ) -> Result<Self, CatalogError> {
        self.register(name, traits)?;
        Ok(self)
    }

    #[must_use]
    pub fn traits(&self, block_type: &str) -> Option<BlockTraits> {
        self.entries.get(block_type).copied()
    }

    #[must_use]
    pub fn contains(&self, block_type: &str) -> bool {
        self.entries.contains_key(block_type)
    }

    /// Whether blocks of this type may own children. Unknown types are not containers.
    #[must_use]
    pub fn is_container(&self, block_type: &str) -> bool {
        self.traits(block_type)
            .is_some_and(|t| t.contains(BlockTraits::CONTAINER))
    }

    #[must_use]
    pub fn is_text_bearing(&self, block_type: &str) -> bool {
        self.traits(block_type)
            .is_some_and(|t| t.contains(BlockTraits::TEXT))
    }

    /// Block type used for component instances, if the vocabulary has one.
    #[must_use]
    pub fn instance_type(&self) -> Option<&str> {
        self.instance_type.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered type names in lexical order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
