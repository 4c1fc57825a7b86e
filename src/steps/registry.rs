//! Ordered registry of provisioning steps.

use tracing::{debug, info};

use super::config::{WriteRuntimeConfigStep, WriteWorkerConfigStep};
use super::host::EnsureDirectoriesStep;
use super::proxy::{InstallProxyExtensionsStep, InstallProxyFeaturesStep, WriteProxyConfigStep};
use super::runtime::{CreateVirtualenvStep, InstallDependenciesStep, InstallRuntimeStep};
use super::service::{InstallServiceManagerStep, RegisterServiceStep, StartServicesStep};
use super::traits::Step;

/// The steps of a run, in execution order.
pub struct StepRegistry {
    steps: Vec<Box<dyn Step>>,
}

impl StepRegistry {
    /// Create a registry holding every built-in step in its fixed order.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        // Host and runtime
        registry.register(Box::new(EnsureDirectoriesStep));
        registry.register(Box::new(InstallRuntimeStep));
        registry.register(Box::new(InstallServiceManagerStep));
        registry.register(Box::new(WriteRuntimeConfigStep));
        registry.register(Box::new(CreateVirtualenvStep));
        registry.register(Box::new(InstallDependenciesStep));

        // Application service
        registry.register(Box::new(RegisterServiceStep));

        // Reverse proxy
        registry.register(Box::new(InstallProxyFeaturesStep));
        registry.register(Box::new(InstallProxyExtensionsStep));
        registry.register(Box::new(WriteProxyConfigStep));

        // Worker pool and startup
        registry.register(Box::new(WriteWorkerConfigStep));
        registry.register(Box::new(StartServicesStep));

        info!(count = registry.steps.len(), "Step registry initialized");

        registry
    }

    /// A registry with no steps.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step. Steps run in registration order.
    pub fn register(&mut self, step: Box<dyn Step>) {
        debug!(step = step.name(), "Registering step");
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}
