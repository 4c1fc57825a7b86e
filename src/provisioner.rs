//! Provisioning orchestration.
//!
//! Runs the registered steps strictly in order against one host. Each step
//! re-checks its precondition, so a run that stopped halfway can simply be
//! started again. The first failure ends the run; nothing is rolled back.
//!
//! Do not run two provisioners against the same host at once. Shared files
//! and the service registry are not locked.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::{
    redact_secrets, sanitize_params, AuditEntry, AuditResult, AuditSink, NullAuditLogger,
};
use crate::config::{Settings, TelemetryCredentials};
use crate::error::ProvisionError;
use crate::host::Host;
use crate::steps::{Check, Step, StepContext, StepOutcome, StepRegistry};
use crate::templates::TemplateEngine;

/// Receives progress notifications while a run is under way.
pub trait ProgressReporter {
    /// Step `index` (1-based) of `total` is about to run.
    fn step_started(&self, index: usize, total: usize, description: &str);

    /// The step finished without error.
    fn step_finished(&self, index: usize, total: usize, outcome: &StepOutcome);
}

/// Prints `[n/total] message` lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn step_started(&self, index: usize, total: usize, description: &str) {
        println!("[{}/{}] {}...", index, total, description);
    }

    fn step_finished(&self, _index: usize, _total: usize, outcome: &StepOutcome) {
        if let StepOutcome::Skipped { reason } = outcome {
            println!("      skipped: {}", reason);
        }
    }
}

/// Discards progress notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn step_started(&self, _index: usize, _total: usize, _description: &str) {}

    fn step_finished(&self, _index: usize, _total: usize, _outcome: &StepOutcome) {}
}

/// Outcome of one step in a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub run_id: Uuid,
    pub steps: Vec<StepReport>,
}

impl ProvisionReport {
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.steps.len() - self.applied()
    }
}

/// What a run would do to a step, without doing it.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub name: &'static str,
    pub description: &'static str,
    pub will_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

/// Runs the provisioning steps against a host.
pub struct Provisioner {
    settings: Settings,
    credentials: TelemetryCredentials,
    host: Host,
    templates: TemplateEngine,
    registry: StepRegistry,
    audit: Box<dyn AuditSink>,
}

impl Provisioner {
    /// Create a provisioner with the built-in steps and no journal.
    pub fn new(
        settings: Settings,
        credentials: TelemetryCredentials,
        host: Host,
    ) -> Result<Self, ProvisionError> {
        settings.validate()?;
        credentials.validate()?;
        let templates = TemplateEngine::embedded()?;

        Ok(Self {
            settings,
            credentials,
            host,
            templates,
            registry: StepRegistry::new(),
            audit: Box::new(NullAuditLogger),
        })
    }

    /// Record every step in `sink`.
    pub fn with_audit(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Replace the step list.
    pub fn with_registry(mut self, registry: StepRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    /// Run every step in order, stopping at the first failure.
    pub fn provision(
        &self,
        progress: &dyn ProgressReporter,
    ) -> Result<ProvisionReport, ProvisionError> {
        let run_id = Uuid::new_v4();
        let total = self.registry.len();
        let mut ctx = StepContext::new(
            run_id,
            &self.settings,
            &self.credentials,
            &self.host,
            &self.templates,
        );
        let mut reports = Vec::with_capacity(total);

        info!(run_id = %run_id, steps = total, "Provisioning started");

        for (i, step) in self.registry.steps().iter().enumerate() {
            let index = i + 1;
            let step = step.as_ref();
            progress.step_started(index, total, step.description());

            let started = Instant::now();
            let result = run_step(step, &mut ctx);
            let duration_ms = started.elapsed().as_millis() as u64;

            let details = sanitize_params(&step.details(&ctx));
            match result {
                Ok(outcome) => {
                    info!(
                        run_id = %run_id,
                        step = step.name(),
                        outcome = ?outcome,
                        duration_ms,
                        "Step finished"
                    );
                    let audit_result = match &outcome {
                        StepOutcome::Applied => AuditResult::Applied,
                        StepOutcome::Skipped { reason } => AuditResult::Skipped {
                            reason: reason.clone(),
                        },
                    };
                    self.journal(AuditEntry::new(
                        run_id,
                        index,
                        step.name(),
                        details,
                        audit_result,
                        duration_ms,
                    ));
                    progress.step_finished(index, total, &outcome);
                    reports.push(StepReport {
                        name: step.name(),
                        outcome,
                        duration_ms,
                    });
                }
                Err(e) => {
                    let message = redact_secrets(&e.to_string(), &self.credentials.secrets());
                    error!(
                        run_id = %run_id,
                        step = step.name(),
                        code = e.code(),
                        error = %message,
                        "Step failed, stopping"
                    );
                    self.journal(AuditEntry::new(
                        run_id,
                        index,
                        step.name(),
                        details,
                        AuditResult::Failure {
                            error_code: e.code().to_string(),
                            error_message: message,
                        },
                        duration_ms,
                    ));
                    return Err(ProvisionError::Step {
                        step: step.name(),
                        source: Box::new(e),
                    });
                }
            }
        }

        let report = ProvisionReport {
            run_id,
            steps: reports,
        };
        info!(
            run_id = %run_id,
            applied = report.applied(),
            skipped = report.skipped(),
            "Provisioning complete"
        );
        Ok(report)
    }

    /// Evaluate every precondition without changing the host.
    pub fn plan(&self) -> Result<Vec<PlannedStep>, ProvisionError> {
        let ctx = StepContext::new(
            Uuid::new_v4(),
            &self.settings,
            &self.credentials,
            &self.host,
            &self.templates,
        );

        self.registry
            .steps()
            .iter()
            .map(|step| -> Result<PlannedStep, ProvisionError> {
                let check = step.check(&ctx).map_err(|e| ProvisionError::Step {
                    step: step.name(),
                    source: Box::new(e),
                })?;
                let (will_run, skip_reason) = match check {
                    Check::Satisfied(reason) => (false, Some(reason)),
                    Check::Required => (true, None),
                };
                Ok(PlannedStep {
                    name: step.name(),
                    description: step.description(),
                    will_run,
                    skip_reason,
                })
            })
            .collect()
    }

    fn journal(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.log(&entry) {
            warn!(error = %e, step = %entry.step, "Failed to write journal entry");
        }
    }
}

fn run_step(step: &dyn Step, ctx: &mut StepContext<'_>) -> Result<StepOutcome, ProvisionError> {
    match step.check(ctx)? {
        Check::Satisfied(reason) => Ok(StepOutcome::Skipped { reason }),
        Check::Required => {
            step.apply(ctx)?;
            Ok(StepOutcome::Applied)
        }
    }
}
