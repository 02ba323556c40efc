//! Display-only blocks. Viewing them is all the interaction there is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Block, BlockBase, BlockError, BlockInput, TeamBlockState};

fn mark_seen(state: &mut TeamBlockState) {
    state.complete(0);
}

/// Free text written in Markdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkdownBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub content: String,
}

impl Block for MarkdownBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "markdown"
    }

    fn display_name(&self) -> &'static str {
        "Markdown"
    }

    fn description(&self) -> &'static str {
        "Text written in Markdown."
    }

    fn requires_validation(&self) -> bool {
        false
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        self.base.update_points(input)?;
        if let Some(content) = input.first("content") {
            self.content = content.to_string();
        }
        Ok(())
    }

    fn validate(&self, state: &mut TeamBlockState, _input: &BlockInput) -> Result<(), BlockError> {
        mark_seen(state);
        Ok(())
    }
}

/// A highlighted message; `variant` selects the styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_variant")]
    pub variant: String,
}

fn default_variant() -> String {
    "info".to_string()
}

impl Default for AlertBlock {
    fn default() -> Self {
        Self {
            base: BlockBase::default(),
            content: String::new(),
            variant: default_variant(),
        }
    }
}

impl Block for AlertBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "alert"
    }

    fn display_name(&self) -> &'static str {
        "Alert"
    }

    fn description(&self) -> &'static str {
        "Display a message to the player."
    }

    fn requires_validation(&self) -> bool {
        false
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        self.base.update_points(input)?;
        if let Some(variant) = input.first("variant") {
            self.variant = variant.trim().to_string();
        }
        if let Some(content) = input.first("content") {
            self.content = content.to_string();
        }
        Ok(())
    }

    fn validate(&self, state: &mut TeamBlockState, _input: &BlockInput) -> Result<(), BlockError> {
        mark_seen(state);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividerBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub title: String,
}

impl Block for DividerBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "divider"
    }

    fn display_name(&self) -> &'static str {
        "Divider"
    }

    fn description(&self) -> &'static str {
        "Simple divider to separate content."
    }

    fn requires_validation(&self) -> bool {
        false
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        if let Some(title) = input.first("title") {
            self.title = title.to_string();
        }
        Ok(())
    }

    fn validate(&self, state: &mut TeamBlockState, _input: &BlockInput) -> Result<(), BlockError> {
        mark_seen(state);
        Ok(())
    }
}
