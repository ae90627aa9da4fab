//! # warden-types
//!
//! Leaf crate of types shared across the Warden core. It exists so the
//! registry and the risk gate can agree on a risk vocabulary without
//! depending on each other.

pub mod level;

pub use level::RiskLevel;
