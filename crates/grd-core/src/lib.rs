//! Core engine for GRD, the GenTool replay downloader.
//!
//! Pipeline: window planning → concurrent log fetch + parse → replay/metadata
//! pairing → concurrent metadata check → concurrent replay download → disk
//! write with collision-safe naming. All fetch rounds share one bounded pool.

pub mod config;
pub mod logging;

pub mod fetch;
pub mod log_parse;
pub mod pairing;
pub mod pipeline;
pub mod storage;
pub mod window;
