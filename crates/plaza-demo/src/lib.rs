#![forbid(unsafe_code)]

//! Headless replay of Plaza navigation scripts.
//!
//! The binary reads a script, drives a [`plaza_runtime::ViewStore`] over an
//! in-memory location, and prints one JSON record per script line.

pub mod cli;
pub mod script;
