pub mod api;
pub mod config;
pub mod control;
pub mod db;
pub mod monitor;
pub mod state;
pub mod telemetry;
pub mod thresholds;
