//! Atomic, attack-resistant file replacement.
//!
//! Rewriting a configuration-like file in place risks leaving it half
//! written on a crash, following a planted symlink to an attacker-chosen
//! path, or silently downgrading its permissions. `safereplace` stages the
//! new contents in an exclusively-created sibling temporary file and
//! atomically renames it over the resolved target, preserving the target's
//! ownership and permission bits along the way.
//!
//! ```no_run
//! use std::io::Write;
//! use safereplace::{AccessMode, begin_replace};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut staged = begin_replace("/etc/myapp.conf", AccessMode::WriteOnly, 0o644)?;
//! staged.write_all(b"a=1\n")?;
//! staged.commit_durable()?;
//! # Ok(())
//! # }
//! ```
//!
//! One in-flight replacement per target path is assumed; the protocol does
//! not arbitrate between two concurrent replacers of the same file. Callers
//! needing multi-writer safety must add their own mutual exclusion around
//! the begin/commit pair.

mod commit;
mod error;
mod resolve;
mod stage;

pub use error::{ReplaceError, Result};
pub use stage::{AccessMode, StagedReplace, begin_replace};
