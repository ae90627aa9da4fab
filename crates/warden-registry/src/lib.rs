//! # warden-registry
//!
//! Capability registration and timeout-bound execution for Warden.
//!
//! The [`CapabilityRegistry`] maps capability names to a
//! ([`CapabilityDescriptor`], [`Capability`]) pair, checks shallow dependency
//! presence, and runs implementations under a per-capability wall-clock
//! timeout. Every outcome — including timeouts, implementation errors, and
//! panics — is returned as a structured [`CapabilityResult`]; nothing is ever
//! thrown past the execute boundary.
//!
//! The registry performs no authorization. The risk gate (`warden-risk`) is
//! consulted by the caller layer before a registry call is made.

pub mod capability;
pub mod descriptor;
pub mod registry;
pub mod result;

pub use capability::Capability;
pub use descriptor::{CapabilityCategory, CapabilityDescriptor, DEFAULT_TIMEOUT_SECS};
pub use registry::CapabilityRegistry;
pub use result::{CapabilityResult, FailureKind};
