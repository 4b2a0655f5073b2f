//! Collected validation errors
//!
//! Rule failures and structural mismatches are not fatal. They are collected
//! as plain data into an [`ErrorSuite`], one suite per validated subject (a
//! CSV file or a schema file). Rendering is left to the caller.

mod suite;

pub use suite::{ErrorSuite, ValidationError};
