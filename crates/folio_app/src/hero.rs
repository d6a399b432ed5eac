// SPDX-License-Identifier: MIT OR Apache-2.0
//! Terminal hero animation.
//!
//! Spawns the name typewriter, the looping role script, and the caret on a
//! real-time scheduler, then repaints a single terminal line until the
//! requested number of script passes has played. A short section-reveal
//! pass follows, driven through the same latch machinery the page uses.

use crate::content;
use folio_motion::{
    CaretBlink, IntersectionSource, RegionId, RevealTrigger, Scheduler, Script, ScriptedText,
    ThreadScheduler, Typewriter, VisibilityFeed, DEFAULT_BLINK_INTERVAL_MS,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Passes of the role script shown before the demo exits.
pub const DEFAULT_PASSES: u32 = 2;

/// Terminal repaint interval, roughly 30 fps.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Caret glyph drawn when the blink phase is visible.
const CARET: char = '▌';

/// Section titles revealed after the hero finishes.
const SECTION_TITLES: [&str; 4] = ["About", "Projects", "Experience", "Contact"];

/// Hero demo errors
#[derive(Debug, thiserror::Error)]
pub enum HeroError {
    /// Reading a script file or writing the terminal failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Script file was not valid RON
    #[error("Failed to parse script: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Script parsed but cannot run
    #[error("Invalid script: {0}")]
    Script(#[from] folio_motion::ScriptError),
}

/// Load a script from a RON file and validate it.
pub fn load_script(path: &Path) -> Result<Script, HeroError> {
    let text = std::fs::read_to_string(path)?;
    let script: Script = ron::from_str(&text)?;
    script.validate()?;
    tracing::info!(
        "Loaded script from {}: {} instructions",
        path.display(),
        script.len()
    );
    Ok(script)
}

/// Compose the hero line for one frame.
///
/// The name caret blinks while the name is typing and stays hidden once it
/// completes; the role caret blinks forever.
pub fn render_line(name: &str, name_complete: bool, role: &str, caret_visible: bool) -> String {
    let caret = if caret_visible { CARET } else { ' ' };
    let name_caret = if name_complete { ' ' } else { caret };
    format!("{name}{name_caret}  ·  {role}{caret}")
}

/// Play the hero animation for `passes` passes of the role script.
pub fn run(script: Script, passes: u32) -> Result<(), HeroError> {
    let pass_ms = script.pass_duration_ms();
    let run_for = Duration::from_millis(
        content::ROLE_START_DELAY_MS + pass_ms.saturating_mul(u64::from(passes)),
    );
    tracing::info!("Running hero: {passes} passes of {pass_ms}ms each");

    let scheduler: Arc<dyn Scheduler> = Arc::new(ThreadScheduler::new());
    let name = Typewriter::spawn(
        Arc::clone(&scheduler),
        content::HERO_NAME,
        content::NAME_SPEED_MS,
        content::NAME_START_DELAY_MS,
    );
    let role = ScriptedText::spawn(Arc::clone(&scheduler), script, content::ROLE_START_DELAY_MS);
    let caret = CaretBlink::spawn(Arc::clone(&scheduler), DEFAULT_BLINK_INTERVAL_MS);

    let deadline = Instant::now() + run_for;
    let mut stdout = std::io::stdout().lock();
    loop {
        let line = render_line(
            &name.text(),
            name.is_complete(),
            &role.text(),
            caret.is_visible(),
        );
        write!(stdout, "\r{line}\x1b[K")?;
        stdout.flush()?;
        // Scripts without a Restart halt on their own; leave early then.
        if Instant::now() >= deadline || (role.is_halted() && name.is_complete()) {
            break;
        }
        std::thread::sleep(FRAME_INTERVAL);
    }
    name.cancel();
    role.cancel();
    caret.cancel();
    writeln!(stdout)?;

    reveal_sections(&mut stdout)?;
    Ok(())
}

/// Scroll the below-the-fold sections in and print each as it latches.
fn reveal_sections(out: &mut impl Write) -> std::io::Result<()> {
    let feed = Arc::new(VisibilityFeed::new());
    let source: Arc<dyn IntersectionSource> = Arc::clone(&feed) as Arc<dyn IntersectionSource>;

    for title in SECTION_TITLES {
        let region = RegionId::new();
        let trigger = RevealTrigger::observe(&source, region);
        // Two sub-threshold samples, then one past it.
        for fraction in [0.02, 0.08, 0.12] {
            feed.publish(region, fraction);
        }
        if trigger.is_visible() {
            writeln!(out, "  {title}")?;
        }
    }
    tracing::debug!(
        "Section reveal left {} live subscriptions",
        feed.subscription_count()
    );
    Ok(())
}

/// Run the built-in role script, or one loaded from a RON file.
pub fn run_from_args(script_path: Option<String>) -> Result<(), HeroError> {
    let script = match script_path {
        Some(path) => load_script(Path::new(&path))?,
        None => content::role_script(),
    };
    run(script, DEFAULT_PASSES)
}
