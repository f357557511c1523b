//! Event-driven projections building the query-side read models.
//!
//! Projections are idempotent: each keeps a per-stream cursor of the last
//! applied sequence number, so redelivered envelopes (the bus is
//! at-least-once) are ignored instead of double-applied.

pub mod orders;
