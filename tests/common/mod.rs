//! Common test utilities for cubesource.
//!
//! This module provides shared assertions and NetCDF source-tree fixtures.

#![allow(dead_code)]

pub mod assertions;
pub mod test_data;
