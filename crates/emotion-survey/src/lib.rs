//! Survey backend for RFID-triggered emotional check-ins.
//!
//! A scanned tag opens a session, voice-transcribed yes/no answers are
//! recorded against it, and a diagnosis is scored once every question is
//! answered. Lifecycle events fan out to live listeners.

pub mod config;
pub mod error;
pub mod store;
pub mod survey;
pub mod telemetry;
