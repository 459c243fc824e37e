//! Dredge - fetch cloud secrets into a CI pipeline step.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── config       # Immutable per-run configuration from step inputs
//! ├── reference    # Secret reference grammar (locator[:OUTPUT] lines)
//! ├── runner       # Host runner primitives (inputs, masks, outputs, env)
//! ├── store        # Secret Manager client behind the SecretStore trait
//! ├── entitlement  # Best-effort licensing pre-flight
//! ├── pipeline     # Sequential fetch → mask → publish loop
//! ├── output       # Terminal output helpers
//! └── error        # Error types per pipeline stage
//! ```
//!
//! # Behavior
//!
//! - References are processed strictly in input order, one at a time.
//! - Every sufficiently long line of a fetched value is registered for
//!   log masking before the value is published anywhere.
//! - A single failed fetch aborts the run; earlier outputs stay set.
//! - Only an explicit entitlement denial stops the run pre-flight;
//!   licensing outages never block a pipeline.

pub mod config;
pub mod entitlement;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod runner;
pub mod store;
