pub mod error;
pub mod metrics;

pub use error::{ExporterError, ExporterResult};
pub use metrics::GaiaMetrics;
