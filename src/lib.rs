//! kinlayout: build, validate and lay out family trees
//!
//! Layered like this:
//! - `domain`: entities, hierarchy builder, validator, layout engine, viewport
//! - `application`: snapshot loading and the render pipeline
//! - `infrastructure`: I/O traits and the service container
//! - `cli`: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
