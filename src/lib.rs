//! Entity-relationship diagrams whose connectors point at columns.
//!
//! Boxes are measured through a [`measure::LayoutProvider`], connectors are
//! cubic curves between the facing box edges at each column row's center, and
//! a text legend always lists every declared relationship.

pub mod config;
pub mod diagram;
pub mod error;
pub mod export;
pub mod fonts;
pub mod geometry;
pub mod legend;
pub mod measure;
pub mod session;
pub mod svg;
pub mod theme;

pub use config::Config;
pub use error::{Error, Result};
