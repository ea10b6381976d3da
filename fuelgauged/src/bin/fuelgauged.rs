//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use fuelgauged::cli;

fn main() {
    cli::main()
}
