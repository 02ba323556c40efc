//! Blocks solved by typing the right word, phrase, or number.
//!
//! Every submission is logged in the team's player data whether or not it
//! matches, so admins can see how a team got there.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Block, BlockBase, BlockError, BlockInput, TeamBlockState};

/// Attempts and guesses recorded against a guess block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessLog {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub guesses: Vec<String>,
}

/// Lowercase and collapse runs of whitespace
fn fuzzy_key(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_match(expected: &str, guess: &str, fuzzy: bool) -> bool {
    if fuzzy {
        fuzzy_key(expected) == fuzzy_key(guess)
    } else {
        expected.trim() == guess.trim()
    }
}

/// Log `guess` and complete the state if it matches.
fn record_guess(
    state: &mut TeamBlockState,
    field: &str,
    input: &BlockInput,
    expected: &str,
    fuzzy: bool,
    points: i32,
) -> Result<(), BlockError> {
    let guess = input.require(field)?;
    let mut log: GuessLog = state.player_data_as()?;
    log.attempts = log.attempts.saturating_add(1);
    log.guesses.push(guess.to_string());
    state.set_player_data(&log)?;

    if is_match(expected, guess, fuzzy) {
        state.complete(points);
    }
    Ok(())
}

fn required_text<'a>(input: &'a BlockInput, field: &str) -> Result<&'a str, BlockError> {
    let value = input.require(field)?;
    if value.trim().is_empty() {
        return Err(BlockError::missing(field));
    }
    Ok(value)
}

/// Players enter a passphrase found at the location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fuzzy: bool,
}

impl Block for PasswordBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "password"
    }

    fn display_name(&self) -> &'static str {
        "Password"
    }

    fn description(&self) -> &'static str {
        "Players must enter the correct password."
    }

    fn requires_validation(&self) -> bool {
        true
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        self.base.update_points(input)?;
        let content = input.require("content")?;
        let password = required_text(input, "block-passphrase")?;
        self.content = content.to_string();
        self.password = password.to_string();
        if let Some(fuzzy) = input.flag("fuzzy") {
            self.fuzzy = fuzzy;
        }
        Ok(())
    }

    fn validate(&self, state: &mut TeamBlockState, input: &BlockInput) -> Result<(), BlockError> {
        record_guess(
            state,
            "password",
            input,
            &self.password,
            self.fuzzy,
            self.base.points,
        )
    }
}

/// Players answer a question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub fuzzy: bool,
}

impl Block for AnswerBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "answer"
    }

    fn display_name(&self) -> &'static str {
        "Answer"
    }

    fn description(&self) -> &'static str {
        "Players must enter the correct answer to a prompt."
    }

    fn requires_validation(&self) -> bool {
        true
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        self.base.update_points(input)?;
        let prompt = input.require("prompt")?;
        let answer = required_text(input, "answer")?;
        self.prompt = prompt.to_string();
        self.answer = answer.to_string();
        if let Some(fuzzy) = input.flag("fuzzy") {
            self.fuzzy = fuzzy;
        }
        Ok(())
    }

    fn validate(&self, state: &mut TeamBlockState, input: &BlockInput) -> Result<(), BlockError> {
        record_guess(
            state,
            "answer",
            input,
            &self.answer,
            self.fuzzy,
            self.base.points,
        )
    }
}

/// Players enter a numeric code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PincodeBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub pincode: String,
}

impl Block for PincodeBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "pincode"
    }

    fn display_name(&self) -> &'static str {
        "Pincode"
    }

    fn description(&self) -> &'static str {
        "Players must enter the correct pincode to a prompt."
    }

    fn requires_validation(&self) -> bool {
        true
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        self.base.update_points(input)?;
        let prompt = input.require("prompt")?;
        let pincode = required_text(input, "pincode")?.trim();
        if !pincode.chars().all(|c| c.is_ascii_digit()) {
            return Err(BlockError::invalid("pincode", "must contain digits only"));
        }
        self.prompt = prompt.to_string();
        self.pincode = pincode.to_string();
        Ok(())
    }

    fn validate(&self, state: &mut TeamBlockState, input: &BlockInput) -> Result<(), BlockError> {
        record_guess(state, "pincode", input, &self.pincode, false, self.base.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockId;

    fn password_block(fuzzy: bool) -> PasswordBlock {
        let mut block = PasswordBlock::default();
        let mut input = BlockInput::new()
            .with("content", "Find the word on the plaque")
            .with("block-passphrase", "Open Sesame")
            .with("points", "10");
        if fuzzy {
            input = input.with("fuzzy", "on");
        }
        block.update_data(&input).unwrap();
        block
    }

    #[test]
    fn wrong_guess_is_logged_not_completed() {
        let block = password_block(false);
        let mut state = TeamBlockState::preview(BlockId::new());

        block
            .validate(&mut state, &BlockInput::new().with("password", "open sesame"))
            .unwrap();

        assert!(!state.is_complete);
        let log: GuessLog = state.player_data_as().unwrap();
        assert_eq!(log.attempts, 1);
        assert_eq!(log.guesses, vec!["open sesame".to_string()]);
    }

    #[test]
    fn right_guess_completes_with_points() {
        let block = password_block(false);
        let mut state = TeamBlockState::preview(BlockId::new());

        block
            .validate(&mut state, &BlockInput::new().with("password", "nope"))
            .unwrap();
        block
            .validate(&mut state, &BlockInput::new().with("password", "Open Sesame "))
            .unwrap();

        assert!(state.is_complete);
        assert_eq!(state.points_awarded, 10);
        let log: GuessLog = state.player_data_as().unwrap();
        assert_eq!(log.attempts, 2);
    }

    #[test]
    fn fuzzy_ignores_case_and_spacing() {
        let block = password_block(true);
        let mut state = TeamBlockState::preview(BlockId::new());
        block
            .validate(
                &mut state,
                &BlockInput::new().with("password", "  open   SESAME"),
            )
            .unwrap();
        assert!(state.is_complete);
    }

    #[test]
    fn missing_guess_is_an_error() {
        let block = password_block(false);
        let mut state = TeamBlockState::preview(BlockId::new());
        let err = block.validate(&mut state, &BlockInput::new()).unwrap_err();
        assert_eq!(err, BlockError::MissingField("password".to_string()));
        assert!(state.player_data.is_null());
    }

    #[test]
    fn password_update_requires_passphrase() {
        let mut block = PasswordBlock::default();
        let err = block
            .update_data(&BlockInput::new().with("content", "hello"))
            .unwrap_err();
        assert_eq!(err, BlockError::MissingField("block-passphrase".to_string()));
    }

    #[test]
    fn answer_block_matches_answer_field() {
        let mut block = AnswerBlock::default();
        block
            .update_data(
                &BlockInput::new()
                    .with("prompt", "What colour is the door?")
                    .with("answer", "Red")
                    .with("fuzzy", "on"),
            )
            .unwrap();
        let mut state = TeamBlockState::preview(BlockId::new());
        block
            .validate(&mut state, &BlockInput::new().with("answer", "red"))
            .unwrap();
        assert!(state.is_complete);
    }

    #[test]
    fn pincode_must_be_digits() {
        let mut block = PincodeBlock::default();
        let err = block
            .update_data(
                &BlockInput::new()
                    .with("prompt", "Safe code")
                    .with("pincode", "12a4"),
            )
            .unwrap_err();
        assert!(matches!(err, BlockError::InvalidField { .. }));

        block
            .update_data(
                &BlockInput::new()
                    .with("prompt", "Safe code")
                    .with("pincode", "1234"),
            )
            .unwrap();
        let mut state = TeamBlockState::preview(BlockId::new());
        block
            .validate(&mut state, &BlockInput::new().with("pincode", "1234"))
            .unwrap();
        assert!(state.is_complete);
    }
}
