//! Service wrapper and service lifecycle steps.
//!
//! - `service_manager.install` - Unpack the service wrapper utility
//! - `service.register` - Replace the application's service registration
//! - `services.start` - Start the application and the proxy host service

mod manager;
mod register;
mod start;

pub use manager::InstallServiceManagerStep;
pub use register::RegisterServiceStep;
pub use start::StartServicesStep;
