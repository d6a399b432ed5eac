// SPDX-License-Identifier: MIT OR Apache-2.0
//! folio - Single-Page Portfolio Motion Demo
//!
//! A terminal rendition of the folio hero featuring:
//! - Typewriter name reveal
//! - Looping "Web2 -> Web3 Developer" role script
//! - Blinking caret
//! - Scroll-reveal section latching
//!
//! ## Architecture
//!
//! All timing lives in the `folio_motion` crate; this binary owns the
//! terminal. Pass a path to a RON script file to play it instead of the
//! built-in role script.

mod content;
mod hero;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("folio=info".parse().unwrap())
        .add_directive("folio_motion=info".parse().unwrap());

    // Logs go to stderr; stdout carries the repainted animation line.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting folio v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = hero::run_from_args(std::env::args().nth(1)) {
        tracing::error!("Hero failed: {e}");
        std::process::exit(1);
    }
}
