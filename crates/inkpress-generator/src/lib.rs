//! Inkpress Generator Library
//!
//! Static site generation engine for Inkpress.
//!
//! # Modules
//!
//! - [`template`] - HTML templates compiled with minijinja
//! - [`collector`] - URL routing, summaries and collection ordering
//! - [`pool`] - Fixed-size worker pool behind a bounded queue
//! - [`assets`] - Static asset mirroring
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod collector;
pub mod pool;
pub mod template;

pub use assets::{AssetCopier, AssetError};
pub use build::{BuildError, BuildStats, Builder};
pub use pool::{Feeder, PoolError, WorkerPool};
pub use template::{Renderer, TemplateError, TemplateRole};
