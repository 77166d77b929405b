//! Core business logic for WAIS.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `split` - Group-expense share splitting and settlement tracking

pub mod split;
