//! # metaswap-cli
//!
//! Shared pieces of the `metaswap` binary.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod context;
pub mod events;
pub mod handler;
pub mod opts;
pub mod utils;
