use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{
    AlertBlock, AnswerBlock, Block, BlockBase, BlockError, BlockRecord, ChecklistBlock,
    DividerBlock, MarkdownBlock, PasswordBlock, PincodeBlock,
};

/// Builds a block from its shared attributes and optional stored payload.
pub type BlockConstructor = fn(BlockBase, Option<&Value>) -> Result<Box<dyn Block>, BlockError>;

fn construct<T>(base: BlockBase, data: Option<&Value>) -> Result<Box<dyn Block>, BlockError>
where
    T: Block + DeserializeOwned + Default + 'static,
{
    let mut block: T = match data {
        Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
        _ => T::default(),
    };
    *block.base_mut() = base;
    Ok(Box::new(block))
}

/// Maps block type tags to constructors.
pub struct BlockRegistry {
    constructors: BTreeMap<&'static str, BlockConstructor>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Create a registry with all built-in block types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("markdown", construct::<MarkdownBlock>);
        registry.register("alert", construct::<AlertBlock>);
        registry.register("divider", construct::<DividerBlock>);
        registry.register("password", construct::<PasswordBlock>);
        registry.register("answer", construct::<AnswerBlock>);
        registry.register("pincode", construct::<PincodeBlock>);
        registry.register("checklist", construct::<ChecklistBlock>);
        registry
    }

    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a block type; a later registration for the same tag wins.
    pub fn register(&mut self, block_type: &'static str, constructor: BlockConstructor) {
        self.constructors.insert(block_type, constructor);
    }

    /// Registered type tags, sorted
    pub fn block_types(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.constructors.contains_key(block_type)
    }

    /// A fresh block of the given type with an empty payload.
    pub fn create(&self, block_type: &str, base: BlockBase) -> Result<Box<dyn Block>, BlockError> {
        self.constructor(block_type)?(base, None)
    }

    /// Rebuild a block from its persisted form.
    pub fn hydrate(&self, record: &BlockRecord) -> Result<Box<dyn Block>, BlockError> {
        self.constructor(&record.block_type)?(record.base(), Some(&record.data))
    }

    fn constructor(&self, block_type: &str) -> Result<BlockConstructor, BlockError> {
        self.constructors
            .get(block_type)
            .copied()
            .ok_or_else(|| BlockError::UnknownType(block_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockInput;
    use crate::LocationId;

    #[test]
    fn registry_includes_all_block_types() {
        let registry = BlockRegistry::new();
        assert_eq!(
            registry.block_types(),
            vec![
                "alert",
                "answer",
                "checklist",
                "divider",
                "markdown",
                "password",
                "pincode"
            ]
        );
    }

    #[test]
    fn registered_tag_matches_block_type() {
        let registry = BlockRegistry::new();
        for tag in registry.block_types() {
            let block = registry
                .create(tag, BlockBase::new(LocationId::new(), 0))
                .unwrap();
            assert_eq!(block.block_type(), tag);
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let registry = BlockRegistry::new();
        let err = registry
            .create("youtube", BlockBase::new(LocationId::new(), 0))
            .unwrap_err();
        assert_eq!(err, BlockError::UnknownType("youtube".to_string()));
    }

    #[test]
    fn empty_registry_has_no_types() {
        assert!(BlockRegistry::empty().block_types().is_empty());
    }

    #[test]
    fn record_hydrates_to_equivalent_block() {
        let registry = BlockRegistry::new();
        let base = BlockBase::new(LocationId::new(), 2);
        let mut block = registry.create("password", base).unwrap();
        block
            .update_data(
                &BlockInput::new()
                    .with("content", "Read the sign")
                    .with("block-passphrase", "lantern")
                    .with("points", "7"),
            )
            .unwrap();

        let record = block.to_record().unwrap();
        assert_eq!(record.block_type, "password");
        assert_eq!(record.points, 7);

        let restored = registry.hydrate(&record).unwrap();
        assert_eq!(restored.id(), base.id);
        assert_eq!(restored.order(), 2);
        assert!(restored.requires_validation());
        assert_eq!(restored.data().unwrap()["password"], "lantern");
    }

    #[test]
    fn malformed_payload_is_reported() {
        let registry = BlockRegistry::new();
        let base = BlockBase::new(LocationId::new(), 0);
        let record = BlockRecord {
            id: base.id,
            location_id: base.location_id,
            block_type: "checklist".to_string(),
            order: 0,
            points: 0,
            data: serde_json::json!({ "list": "not a list" }),
        };
        assert!(matches!(
            registry.hydrate(&record),
            Err(BlockError::Payload(_))
        ));
    }
}
