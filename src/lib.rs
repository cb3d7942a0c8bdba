//! Cartel - a decentralized dependency manager for Xcode framework projects
//!
//! Cartel reads a `Cartelfile` listing source repositories and version
//! constraints, fetches those repositories, chooses a mutually compatible set
//! of tagged versions, checks them out, drives `xcodebuild` to produce binary
//! frameworks, and records the exact versions chosen in `Cartelfile.resolved`.
//!
//! # Core Modules
//!
//! - [`version`] - Semantic versions, pinned revisions, and version specifiers
//! - [`project`] - Project identities, dependencies, and progress events
//! - [`manifest`] - `Cartelfile` parsing and emission
//! - [`lockfile`] - `Cartelfile.resolved` parsing and atomic emission
//! - [`gateway`] - The repository interface the resolver consumes
//! - [`resolver`] - Backtracking version resolution over lazily discovered graphs
//! - [`git`] - Git operations wrapper using the system git command
//! - [`cache`] - Bare-clone repository cache with fetch deduplication
//! - [`coordinator`] - Clone/resolve/checkout sequencing and event broadcast
//! - [`xcode`] - Scheme discovery, per-platform builds, and binary merging
//! - [`cli`] - Command-line interface implementation

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod core;
pub mod gateway;
pub mod git;
pub mod lockfile;
pub mod manifest;
pub mod project;
pub mod resolver;
pub mod shell;
pub mod utils;
pub mod version;
pub mod xcode;
