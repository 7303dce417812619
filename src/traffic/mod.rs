pub mod config;
pub mod origin;
pub mod patterns;

pub use config::TrafficConfig;
pub use origin::{OriginSummary, TrafficOrigin};
pub use patterns::{AddressPattern, PatternKind};
