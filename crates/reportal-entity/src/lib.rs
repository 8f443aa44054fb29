//! # reportal-entity
//!
//! Domain entity models for Reportal capacity management. Every struct in
//! this crate represents a database table row or a domain value object.
//! Database entities additionally derive `sqlx::FromRow`.

pub mod activity;
pub mod capacity;
pub mod schedule;
