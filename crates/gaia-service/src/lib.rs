pub mod http;
pub mod logging;
pub mod modes;
pub mod shutdown;

pub use http::{routes, AppState};
pub use modes::{run_benchmark, run_self_test, BenchmarkReport, SelfTestReport};
