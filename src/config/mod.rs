//! Pilot Configuration Module
//!
//! Configuration loaded from a TOML file, with every field defaulted so an
//! empty or missing file gives a working (if unconfigured) pilot.
//!
//! ## Loading Order
//!
//! 1. Explicit path (the `--config` flag)
//! 2. `PILOT_CONFIG` environment variable (path to TOML file)
//! 3. `pilot.toml` in the current working directory
//! 4. Built-in defaults
//!
//! ## Example
//!
//! ```toml
//! [pilot]
//! interval_secs = 3600
//!
//! [site]
//! url = "https://example.go-vip.co"
//!
//! [probe]
//! base_url = "http://127.0.0.1:8089"
//! ```

mod pilot_config;

pub use pilot_config::*;
