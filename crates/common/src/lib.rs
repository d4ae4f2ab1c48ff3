// # -----------------------------
// # crates/common/src/lib.rs
// # -----------------------------
//! Platform facts and filesystem primitives shared by the polyshell crates.

pub mod env;
pub mod fs;
pub mod paths;
pub mod platform;

pub use env::{expand_env, expand_env_with};
pub use paths::{absolutize, absolutize_from, is_system_bash, normalize_separators, to_mount_path};
pub use platform::{Platform, IS_WINDOWS};
