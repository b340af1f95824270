//! Top-level test module for sheetql
//!
//! This file organizes the library-level tests into categories.

mod aggregate;
mod grouping;
mod helpers;
mod properties;
mod select;
mod update_delete;
