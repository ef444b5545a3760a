#![cfg(test)]

pub mod lifecycle_tests;
pub mod manifest_tests;
