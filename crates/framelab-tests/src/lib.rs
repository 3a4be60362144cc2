//! Integration test crate for FrameLab.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every framelab library crate to verify they work together.

#[cfg(test)]
mod effects;

#[cfg(test)]
mod history;
