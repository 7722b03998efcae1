//! Interactive flowchart trees.
//!
//! - [`domain`]: path-copying node tree, input events and the pure layout engine;
//! - [`application`]: the session controller reducing events into new trees;
//! - [`render`]: text views of trees and layouts;
//! - [`cli`]: the `flowtree` command line host.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod render;
pub mod util;
