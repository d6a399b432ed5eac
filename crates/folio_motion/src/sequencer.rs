// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted text sequencer.
//!
//! Executes a [`Script`] against a text buffer one micro-step at a time:
//! `Type` grows the buffer a character per step, `Delete`/`DeleteAll` shrink
//! it, `Pause` waits, `Restart` clears and loops. [`SequencerState`] is the
//! bare state machine, advanced by explicit [`step`](SequencerState::step)
//! calls; [`ScriptedText`] drives one on a [`Scheduler`].
//!
//! The machine is deterministic: the same script always produces the same
//! buffer sequence and the same delays. A script that runs off its end
//! without `Restart` halts and is never advanced again.

use crate::driver::{Driver, Stepper};
use crate::scheduler::Scheduler;
use crate::script::{Instruction, Script};
use std::sync::Arc;

/// Delay between the end of one instruction and the first micro-step of the
/// next, in milliseconds.
pub const INSTRUCTION_GAP_MS: u64 = 50;

/// One resolved micro-step, decided before the buffer is touched.
enum Advance {
    /// Append a character, next step after the instruction's speed.
    Push(char, u64),
    /// Remove the trailing character, next step after the instruction's speed.
    Pop(u64),
    /// Instruction finished; move on after the inter-instruction gap.
    EndInstruction,
    /// Pause consumed; move on after its duration.
    Wait(u64),
    /// Restart reached; clear everything and loop after the gap.
    Rewind,
}

/// State machine executing a [`Script`] against a text buffer.
///
/// `buffer` is the only externally observable value; it is always a valid
/// intermediate of the current instruction's effect. The machine never
/// fails: over-long deletes are clamped to the characters actually buffered,
/// and an empty script halts on the first step without touching the buffer.
#[derive(Debug, Clone)]
pub struct SequencerState {
    /// The script being executed; shared read-only by every pass.
    script: Script,
    /// Text produced so far.
    buffer: String,
    /// Index of the instruction currently executing.
    instruction_index: usize,
    /// Intra-instruction cursor: byte offset into a `Type` text, characters
    /// removed so far for a `Delete`.
    progress: usize,
    /// Set once the script runs off its end without a `Restart`.
    halted: bool,
}

impl SequencerState {
    /// Machine positioned at the first instruction with an empty buffer.
    pub fn new(script: Script) -> Self {
        Self {
            script,
            buffer: String::new(),
            instruction_index: 0,
            progress: 0,
            halted: false,
        }
    }

    /// Advance one micro-step.
    ///
    /// Returns the delay to the next micro-step in milliseconds, or `None`
    /// once halted. Stepping a halted machine stays a no-op.
    pub fn step(&mut self) -> Option<u64> {
        if self.halted {
            return None;
        }
        let advance = match self.script.get(self.instruction_index) {
            None => {
                self.halted = true;
                tracing::debug!("Sequencer halted at end of script");
                return None;
            }
            Some(Instruction::Type { text, speed_ms }) => match text[self.progress..].chars().next() {
                Some(ch) => Advance::Push(ch, *speed_ms),
                None => Advance::EndInstruction,
            },
            Some(Instruction::Delete { count, speed_ms }) => {
                if self.progress < *count as usize && !self.buffer.is_empty() {
                    Advance::Pop(*speed_ms)
                } else {
                    // Count satisfied, or clamped because the buffer emptied early.
                    Advance::EndInstruction
                }
            }
            Some(Instruction::DeleteAll { speed_ms }) => {
                if self.buffer.is_empty() {
                    Advance::EndInstruction
                } else {
                    Advance::Pop(*speed_ms)
                }
            }
            Some(Instruction::Pause { duration_ms }) => Advance::Wait(*duration_ms),
            Some(Instruction::Restart) => Advance::Rewind,
        };

        match advance {
            Advance::Push(ch, speed_ms) => {
                self.buffer.push(ch);
                self.progress += ch.len_utf8();
                Some(speed_ms)
            }
            Advance::Pop(speed_ms) => {
                self.buffer.pop();
                self.progress += 1;
                Some(speed_ms)
            }
            Advance::EndInstruction => {
                self.progress = 0;
                self.instruction_index += 1;
                Some(INSTRUCTION_GAP_MS)
            }
            Advance::Wait(duration_ms) => {
                self.progress = 0;
                self.instruction_index += 1;
                Some(duration_ms)
            }
            Advance::Rewind => {
                self.buffer.clear();
                self.progress = 0;
                self.instruction_index = 0;
                Some(INSTRUCTION_GAP_MS)
            }
        }
    }

    /// Text produced so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether the script ran off its end without a `Restart`.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Index of the instruction currently executing.
    pub fn instruction_index(&self) -> usize {
        self.instruction_index
    }

    /// The script being executed.
    pub fn script(&self) -> &Script {
        &self.script
    }
}

impl Stepper for SequencerState {
    fn step(&mut self) -> Option<u64> {
        SequencerState::step(self)
    }
}

/// Spawned sequencer: a [`SequencerState`] driven on a scheduler.
///
/// Advances are strictly sequential; at most one is pending at a time.
/// Cancelling (or dropping) the handle freezes the buffer permanently, even
/// if a callback is already queued.
pub struct ScriptedText {
    driver: Driver<SequencerState>,
}

impl ScriptedText {
    /// Start executing `script`, first advance `start_delay_ms` from now.
    ///
    /// An empty script is accepted and halts on its first advance.
    pub fn spawn(scheduler: Arc<dyn Scheduler>, script: Script, start_delay_ms: u64) -> Self {
        tracing::debug!(
            "Spawning scripted text: {} instructions, start delay {start_delay_ms}ms",
            script.len()
        );
        Self {
            driver: Driver::spawn(scheduler, SequencerState::new(script), start_delay_ms),
        }
    }

    /// Buffer after the most recent completed micro-step.
    pub fn text(&self) -> String {
        self.driver.with(|state| state.buffer().to_owned())
    }

    /// Whether the script ran off its end without a `Restart`.
    pub fn is_halted(&self) -> bool {
        self.driver.with(SequencerState::is_halted)
    }

    /// Stop all pending advances. Idempotent; [`text`](Self::text) keeps
    /// returning the frozen value.
    pub fn cancel(&self) {
        self.driver.cancel();
    }
}
