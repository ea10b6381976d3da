//
// Copyright (c) Memfault, Inc.
// See License.txt for details
pub mod cli;
pub mod config;
mod fuelgauged;
pub mod gauge;
pub mod monitor;
pub mod report;
pub mod sleep;
#[cfg(test)]
mod test_utils;
pub mod util;
