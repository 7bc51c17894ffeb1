//! Shared test helpers for `outlooksync-core` integration tests.
//!
//! These helpers provide lightweight in-memory ports so that sync tests can
//! focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod calendar;
