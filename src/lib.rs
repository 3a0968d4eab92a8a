//! Discrete-event simulation of users contending for reader/writer tables.
//!
//! Users issue reads and writes at exponential intervals; each table admits
//! them first-come-first-served, running either one write or a batch of
//! consecutive reads at a time.

pub mod config;
pub mod error;
pub mod helpers;
pub mod network;
pub mod report;
pub mod seed;
pub mod tables;
pub mod users;
