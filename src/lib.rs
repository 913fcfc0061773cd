//! # Commit Index
//!
//! Builds a queryable relational index of a git repository's commit history:
//! per-commit metadata, per-file change records (with rename/copy tracking
//! and add/delete line counts), and a lightweight heuristic symbol index for
//! source files touched by each commit.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌──────────┐
//! │   git    │──▶│ changeset   │──▶│ builder   │──▶│  SQLite   │
//! │ (repo)   │   │ + symbols  │   │ (1 tx per │   │ (store)  │
//! └──────────┘   └────────────┘   │  commit)  │   └────┬─────┘
//!                                 └───────────┘        │
//!                                                      ▼
//!                                                 ┌──────────┐
//!                                                 │   CLI    │
//!                                                 │  (cidx)  │
//!                                                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cidx build --repo . --db ./commit-index.db
//! cidx commits --limit 10
//! cidx show 0f3a9c
//! cidx symbol ParseStatus
//! cidx stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`repo`] | Git repository reader (subprocess-backed) |
//! | [`changeset`] | NUL-delimited status/numstat parsing and merging |
//! | [`symbols`] | Heuristic symbol extraction |
//! | [`store`] | Schema creation and row writes |
//! | [`builder`] | Build orchestration |
//! | [`inspect`] | Read-only query commands |
//! | [`progress`] | Build progress reporting |
//! | [`db`] | Database connection |
//! | [`error`] | Typed pipeline errors |

pub mod builder;
pub mod changeset;
pub mod config;
pub mod db;
pub mod error;
pub mod inspect;
pub mod models;
pub mod progress;
pub mod repo;
pub mod store;
pub mod symbols;
