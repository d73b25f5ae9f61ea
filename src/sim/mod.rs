/// Bus capacitor integration and the load seam.
pub mod bus;
/// Fixed-step run plan and simulation clock.
pub mod clock;
/// PWM switching stage.
pub mod converter;
pub mod electrolyzer;
pub mod engine;
pub mod error;
pub mod metrics;
/// Aggregated PV current source.
pub mod panel;
pub mod types;
