//
// Copyright (c) Memfault, Inc.
// See License.txt for details
pub mod serialization;
pub mod string;
pub mod task;
pub mod time_measure;
