//! Shared helpers for sifter integration tests

#![allow(dead_code)]

pub mod test_job;
