// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod clock;
pub mod config;
pub mod display;
pub mod document;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod util;
