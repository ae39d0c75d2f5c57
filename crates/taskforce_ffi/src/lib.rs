//! Flutter bridge surface over `taskforce_core`.

pub mod api;
