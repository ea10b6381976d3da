//
// Copyright (c) Memfault, Inc.
// See License.txt for details
//! Test helpers shared by the unit tests of this crate.

use rstest::fixture;

mod test_instant;
pub use test_instant::TestInstant;

#[fixture]
/// Simple fixture to add to a test when you want the logger to work.
pub fn setup_logger() {
    let _ = stderrlog::new().module("fuelgauged").verbosity(10).init();
}
