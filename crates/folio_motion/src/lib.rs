// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text-motion core for folio.
//!
//! This crate provides the timed text effects behind the folio hero:
//! - Scripted typing sequences (type, delete, pause, loop)
//! - Bounded one-shot typewriters
//! - Blinking caret state
//! - Scroll-reveal latching
//!
//! ## Architecture
//!
//! The crate is built on:
//! - Explicit state machines advanced one timer event at a time
//! - An injected [`Scheduler`] owning all timing (a real-time thread
//!   scheduler for hosts, a manual clock for tests)
//! - A driver that keeps at most one pending timer per effect and makes
//!   cancellation idempotent
//! - An [`IntersectionSource`] seam between reveal latches and whatever
//!   reports region visibility

pub mod caret;
mod driver;
pub mod reveal;
pub mod scheduler;
pub mod script;
pub mod sequencer;
pub mod typewriter;

pub use caret::{CaretBlink, CaretState, DEFAULT_BLINK_INTERVAL_MS};
pub use reveal::{
    IntersectionSource, RegionId, RevealOptions, RevealTrigger, RootMargin, SubscriptionId,
    VisibilityCallback, VisibilityFeed,
};
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TimerCallback, TimerToken};
pub use script::{Instruction, Script, ScriptBuilder, ScriptError};
pub use sequencer::{ScriptedText, SequencerState, INSTRUCTION_GAP_MS};
pub use typewriter::{Typewriter, TypewriterState};
