pub mod workspace;

pub use workspace::TempWorkspace;
#[cfg(unix)]
pub use workspace::{mode_of, set_mode};
