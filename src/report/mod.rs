//! Report renderers.
//!
//! - [`terminal`] — colored listings and a verdict table; respects `--verbose` / `--quiet`.
//!
//! JSON output is produced directly from the serializable models in `main`.

pub mod terminal;
