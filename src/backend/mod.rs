//! External collaborator seams.
//!
//! The runtime never talks to hardware directly. Everything it needs from
//! the outside world is expressed as a small capability trait:
//!
//! - [`SampleSource`] — produce one decoded sample on demand
//! - [`BatchBackend`] — negotiate batch parameters and drain accumulated data
//! - [`EventReporter`] — deliver samples and batches to the consumer
//!
//! [`FusionBackend`] combines the two backend capabilities for trait-object
//! use. [`mock`] provides simulated implementations for tests and the demo
//! binary.

pub mod capabilities;
pub mod mock;

pub use capabilities::{BatchBackend, EventReporter, FusionBackend, SampleSource};
