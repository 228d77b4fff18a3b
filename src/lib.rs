// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires the terminal to `app::App`.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod report;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod util;
pub mod zone;

pub use app::{App, AppState};
pub use error::OpenFieldError;
pub use session::{SessionController, SessionStatus, StopKind, TestConfig, TickOutcome};
pub use zone::{Zone, ZoneSnapshot, ZoneTimer};
