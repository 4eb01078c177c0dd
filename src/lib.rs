//! Lesson Registry - Lesson-slot registration engine
//!
//! Validates registration requests, detects scheduling conflicts, and
//! manages registration lifecycles over tabular entity stores, with
//! notifications and audit events delivered out of band.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
