//! Portal Module
//! Mission: Validate inbound tokens and relay requests across the trust boundary

pub mod api;
pub mod attendance;
pub mod proxy;

pub use api::PortalState;
pub use attendance::{AttendanceClient, AttendanceError};
pub use proxy::{GatewayClient, ProxyError};
