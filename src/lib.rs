// src/lib.rs

//! kptail library
//!
//! Tails the GFZ Kp/ap geomagnetic index feed: downloads the nowcast file,
//! detects records newer than the persisted cursor, and renders them as
//! InfluxDB line protocol.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod utils;
