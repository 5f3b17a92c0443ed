// readmegen/src/lib.rs
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod util;
pub mod config;

pub mod budget;
pub mod classify;
pub mod importance;
pub mod scan;
pub mod sample;

pub mod prompt;
pub mod backend;
pub mod writeback;

pub mod commands;

pub use scan::{scan, scan_with, ScanError, ScanResult};
