#![forbid(unsafe_code)]

mod module;
mod network;
mod route;

pub use module::ModuleHandle;
pub use network::{EffectiveType, NetworkSignal, NetworkTier};
pub use route::{LoaderHandle, RouteEntry, RoutePath};
