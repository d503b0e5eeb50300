pub mod service;

pub use service::TelemetryService;
