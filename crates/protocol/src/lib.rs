//! Wire types shared by the unipfp runtime and orchestration crates.
//!
//! Types in this crate are pure data. [`StorageState`] mirrors the JSON
//! document Playwright produces for `browserContext.storageState()`, so a
//! session file written by this workspace can be loaded by any Playwright
//! binding and vice versa.

pub mod files;
pub mod storage_state;

pub use files::*;
pub use storage_state::*;
