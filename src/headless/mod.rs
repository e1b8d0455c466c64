//! Headless mode for agentic testing
//!
//! Runs battles without any graphical output. A scripted presenter plays the
//! role of the animation layer, confirming hits after fixed delays.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless match as fast as possible
//! cargo run --release -- --headless demos/match_config.json
//!
//! # Run it at wall-clock speed
//! cargo run --release -- --headless demos/match_config.json --realtime
//!
//! # ...or at double speed
//! cargo run --release -- --headless demos/match_config.json --realtime --speed 2
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "stage": "1-1",
//!   "party": [{ "unit": "knight", "level": 2 }, null, { "unit": "archer" }],
//!   "max_duration_secs": 120,
//!   "random_seed": 7
//! }
//! ```

pub mod config;
pub mod feedback;
pub mod presenter;
pub mod runner;

pub use config::{AnimationTimings, HeadlessMatchConfig};
pub use feedback::{FloatingNumbers, GameRng};
pub use presenter::{AnimationSignal, HeadlessPresenter};
pub use runner::{run_headless_match, simulate_match, HeadlessMatch, MatchResult, UnitResult};
