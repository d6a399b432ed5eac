// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hero copy and timing constants.
//!
//! Everything timed in the hero lives here so the values read as one
//! choreography: the name types in first, the role line starts while the
//! name is still settling, and the role script loops forever.

use folio_motion::Script;

/// Name typed into the hero headline.
pub const HERO_NAME: &str = "Folio";

/// Per-character delay for the hero name, in milliseconds.
pub const NAME_SPEED_MS: u64 = 100;

/// Delay before the hero name starts typing, in milliseconds.
pub const NAME_START_DELAY_MS: u64 = 500;

/// Delay before the role line starts its script, in milliseconds.
pub const ROLE_START_DELAY_MS: u64 = 1800;

/// The looping role line: types "Web2", corrects itself to "Web3",
/// finishes the title, wipes, and starts over.
pub fn role_script() -> Script {
    Script::builder()
        .type_text("Web2", 120)
        .pause(800)
        .delete(1, 80)
        .pause(300)
        .type_text("3", 120)
        .pause(200)
        .type_text(" Developer", 100)
        .pause(1000)
        .delete_all(50)
        .pause(1000)
        .restart()
        .build()
}
