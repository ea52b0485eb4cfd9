//! In-process hand-off layer for the tickflow pipeline.
//!
//! A single transport primitive lives here: a bounded single-producer
//! single-consumer ring. Every stage boundary in the pipeline is one ring
//! with exactly one task on each side, so nothing on the hot path takes a
//! lock or makes a syscall.

mod ring;

pub use ring::SpscRing;
