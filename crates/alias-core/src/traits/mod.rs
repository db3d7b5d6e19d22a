//! Core traits for the alias engine
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`StateStore`]: Durable storage for the pool and the assignment record

pub mod state_store;

pub use state_store::StateStore;
