//! Console output: messages, live progress rendering, and the run summary.

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{print_banner, print_error, print_info, print_success, print_warning};
pub use progress::render_events;
pub use stats::print_run_summary;
