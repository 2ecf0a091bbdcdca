#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Shared logic for the heartbeat/trigger supervisor.
//
// The crate stays portable across the MCU firmware and host tooling by
// avoiding the Rust standard library. Everything the interrupt path touches is
// a single-word atomic, so the same types can live in a `static` on the
// target and on the stack in host tests.

pub mod config;
pub mod lines;
pub mod monitor;
pub mod output;
pub mod script;
pub mod status;
pub mod supervisor;
pub mod telemetry;
pub mod timing;
pub mod trigger;
