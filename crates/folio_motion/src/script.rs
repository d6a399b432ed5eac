// SPDX-License-Identifier: MIT OR Apache-2.0
//! Script data model for the scripted text sequencer.
//!
//! A [`Script`] is a fixed, ordered list of [`Instruction`]s executed by
//! [`SequencerState`](crate::sequencer::SequencerState) one micro-step at a
//! time. Scripts are plain serde data (RON on disk), so demo hosts can swap
//! in their own without recompiling.

use crate::sequencer::INSTRUCTION_GAP_MS;
use serde::{Deserialize, Serialize};

/// One scripted step of the text animation.
///
/// Delays are in milliseconds, matching the scheduling granularity of the
/// whole crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Append the characters of `text` one at a time.
    Type {
        /// Text appended by this instruction.
        text: String,
        /// Delay between appended characters.
        speed_ms: u64,
    },
    /// Remove trailing characters one at a time.
    Delete {
        /// Characters to remove, clamped to what is actually buffered.
        count: u32,
        /// Delay between removals.
        speed_ms: u64,
    },
    /// Remove trailing characters one at a time until the buffer is empty.
    DeleteAll {
        /// Delay between removals.
        speed_ms: u64,
    },
    /// Leave the buffer untouched and wait.
    Pause {
        /// Delay before the next instruction begins.
        duration_ms: u64,
    },
    /// Clear the buffer and start over from the first instruction.
    Restart,
}

/// An ordered, immutable sequence of [`Instruction`]s.
///
/// Construction fixes the script; every pass of the sequencer reads the same
/// instructions. Scripts meant to loop forever must end with
/// [`Instruction::Restart`] — running off the end halts the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Script {
    /// Instructions in execution order.
    instructions: Vec<Instruction>,
}

impl Script {
    /// Create a script from instructions in execution order.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Start building a script fluently.
    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the script has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// All instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Check the script for authoring mistakes.
    ///
    /// Rejects empty scripts and any `Delete` that would remove more
    /// characters than the first pass has buffered at that point. The
    /// sequencer itself clamps instead of failing, so validation is for
    /// callers that prefer rejecting a user-supplied script up front.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.instructions.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        let mut buffered: usize = 0;
        for (index, instruction) in self.instructions.iter().enumerate() {
            match instruction {
                Instruction::Type { text, .. } => buffered += text.chars().count(),
                Instruction::Delete { count, .. } => {
                    let count = *count as usize;
                    if count > buffered {
                        return Err(ScriptError::DeleteUnderflow {
                            index,
                            count,
                            available: buffered,
                        });
                    }
                    buffered -= count;
                }
                Instruction::DeleteAll { .. } => buffered = 0,
                Instruction::Pause { .. } => {}
                Instruction::Restart => break,
            }
        }
        Ok(())
    }

    /// Scheduled duration of one pass, in milliseconds.
    ///
    /// Covers the span from the first micro-step of instruction 0 up to the
    /// first micro-step of the next pass (for looping scripts this is the
    /// cycle period). Mirrors the sequencer's clamping, so the value is
    /// exact even for over-long deletes.
    pub fn pass_duration_ms(&self) -> u64 {
        let mut buffered: u64 = 0;
        let mut total: u64 = 0;
        for instruction in &self.instructions {
            match instruction {
                Instruction::Type { text, speed_ms } => {
                    let chars = text.chars().count() as u64;
                    buffered += chars;
                    total += chars * speed_ms + INSTRUCTION_GAP_MS;
                }
                Instruction::Delete { count, speed_ms } => {
                    let removed = u64::from(*count).min(buffered);
                    buffered -= removed;
                    total += removed * speed_ms + INSTRUCTION_GAP_MS;
                }
                Instruction::DeleteAll { speed_ms } => {
                    total += buffered * speed_ms + INSTRUCTION_GAP_MS;
                    buffered = 0;
                }
                Instruction::Pause { duration_ms } => total += duration_ms,
                Instruction::Restart => {
                    total += INSTRUCTION_GAP_MS;
                    break;
                }
            }
        }
        total
    }
}

/// Error found while validating a [`Script`].
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script contains no instructions.
    #[error("script contains no instructions")]
    EmptyScript,

    /// A `Delete` removes more characters than the first pass buffers.
    #[error("delete at instruction {index} removes {count} characters but only {available} are buffered")]
    DeleteUnderflow {
        /// Position of the offending instruction.
        index: usize,
        /// Characters the instruction asks to remove.
        count: usize,
        /// Characters actually buffered when it executes.
        available: usize,
    },
}

/// Fluent constructor for [`Script`].
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    instructions: Vec<Instruction>,
}

impl ScriptBuilder {
    /// Append an [`Instruction::Type`].
    pub fn type_text(mut self, text: impl Into<String>, speed_ms: u64) -> Self {
        self.instructions.push(Instruction::Type {
            text: text.into(),
            speed_ms,
        });
        self
    }

    /// Append an [`Instruction::Delete`].
    pub fn delete(mut self, count: u32, speed_ms: u64) -> Self {
        self.instructions.push(Instruction::Delete { count, speed_ms });
        self
    }

    /// Append an [`Instruction::DeleteAll`].
    pub fn delete_all(mut self, speed_ms: u64) -> Self {
        self.instructions.push(Instruction::DeleteAll { speed_ms });
        self
    }

    /// Append an [`Instruction::Pause`].
    pub fn pause(mut self, duration_ms: u64) -> Self {
        self.instructions.push(Instruction::Pause { duration_ms });
        self
    }

    /// Append an [`Instruction::Restart`].
    pub fn restart(mut self) -> Self {
        self.instructions.push(Instruction::Restart);
        self
    }

    /// Finish the script.
    pub fn build(self) -> Script {
        Script::new(self.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_instruction_order() {
        let script = Script::builder()
            .type_text("ab", 100)
            .pause(300)
            .delete(1, 80)
            .delete_all(50)
            .restart()
            .build();

        assert_eq!(script.len(), 5);
        assert!(matches!(script.get(0), Some(Instruction::Type { text, speed_ms: 100 }) if text == "ab"));
        assert!(matches!(script.get(1), Some(Instruction::Pause { duration_ms: 300 })));
        assert!(matches!(script.get(4), Some(Instruction::Restart)));
        assert!(script.get(5).is_none());
    }

    #[test]
    fn test_validate_rejects_empty_script() {
        let script = Script::default();
        assert!(matches!(script.validate(), Err(ScriptError::EmptyScript)));
    }

    #[test]
    fn test_validate_rejects_delete_underflow() {
        let script = Script::builder().type_text("abc", 100).delete(5, 80).build();
        assert!(matches!(
            script.validate(),
            Err(ScriptError::DeleteUnderflow {
                index: 1,
                count: 5,
                available: 3,
            })
        ));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        // Two characters, four bytes: deleting both must validate.
        let script = Script::builder().type_text("éé", 100).delete(2, 80).build();
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_balanced_script() {
        let script = Script::builder()
            .type_text("Web2", 120)
            .delete(1, 80)
            .type_text("3", 120)
            .delete_all(50)
            .restart()
            .build();
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_pass_duration_sums_steps_and_gaps() {
        let script = Script::builder().type_text("ab", 100).pause(300).restart().build();
        // Two characters at 100 plus a gap, the pause, and the restart gap.
        assert_eq!(script.pass_duration_ms(), 200 + 50 + 300 + 50);
    }

    #[test]
    fn test_pass_duration_clamps_overlong_delete() {
        let script = Script::builder().type_text("a", 10).delete(5, 10).build();
        // Only one character is ever buffered, so only one removal is paid for.
        assert_eq!(script.pass_duration_ms(), (10 + 50) + (10 + 50));
    }

    #[test]
    fn test_ron_round_trip() {
        let script = Script::builder()
            .type_text("Web2", 120)
            .pause(800)
            .delete(1, 80)
            .delete_all(50)
            .restart()
            .build();

        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let text = ron::ser::to_string_pretty(&script, config).unwrap();
        let loaded: Script = ron::from_str(&text).unwrap();
        assert_eq!(loaded, script);
    }
}
