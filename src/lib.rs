//! Screw-sort puzzle engine (workspace facade crate).
//!
//! This package keeps a single `screw_sort::{core,engine,types}` public
//! API stable while the implementation lives in dedicated crates under
//! `crates/`.

pub use screw_sort_core as core;
pub use screw_sort_engine as engine;
pub use screw_sort_types as types;
