//! Audio session introspection
//!
//! Category and route queries, permission state, and the monitor that turns
//! platform notifications into events. The platform itself sits behind the
//! `AudioSessionControl`, `RouteControl` and `PermissionProvider` traits.

mod category;
mod headless;
mod monitor;
mod permission;
mod route;

pub(crate) use category::{ensure_category, restore_category};
pub use category::{current_category, AudioSessionControl, CategoryOptions, SessionCategory};
pub use headless::{HeadlessAudioSession, HeadlessPermissions};
pub use monitor::SessionMonitor;
pub use permission::{PermissionProvider, PermissionState};
pub use route::{PortDescription, RouteChange, RouteControl};
