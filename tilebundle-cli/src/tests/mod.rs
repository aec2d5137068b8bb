//! Shared test harness modules for the tilebundle CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod classify_unit;
mod helpers;
