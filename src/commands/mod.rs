pub mod run;
pub mod state;

// Re-export command functions for convenience
pub use run::{once, run};
pub use state::show_state;
