//! Integration test suite for the Keel wallet engine.
//!
//! Drives full wallet flows — key custody, transfer preparation, fee
//! selection, broadcast, confirmation polling, and the rate-limit retry
//! policy — against a scripted gateway and pass-through signers.

pub mod helpers;
