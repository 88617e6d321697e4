//! Workflow execution engine
//!
//! This module provides the WorkflowEngine that submits an Application's
//! workflow steps in order and decides, from the status each submitted
//! object reports, whether the pass advances, waits or stops.

use crate::applicator::Applicator;
use crate::error::{Result, WorkflowError};
use crate::evaluator::StepStatusEvaluator;
use crate::reader::ConditionReader;
use appflow_crd::{
    Application, ApplicationPhase, UnstructuredObject, WorkflowContext, WorkflowStep,
    WorkflowStepPhase,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Event emitted during a pass
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// Pass started
    PassStarted { app: String, steps: usize },
    /// Step object submitted
    StepSubmitted {
        app: String,
        step: String,
        index: usize,
    },
    /// Step phase determined
    StepEvaluated {
        app: String,
        step: String,
        index: usize,
        phase: WorkflowStepPhase,
    },
    /// Pass returned without error
    PassFinished { app: String, finished: bool },
    /// Pass aborted by an infrastructure error at `step`
    PassAborted {
        app: String,
        step: String,
        error: String,
    },
}

/// Workflow execution engine
///
/// One call to [`WorkflowEngine::execute_steps`] is one pass:
/// 1. Rebuild the Application's step status list from scratch
/// 2. Submit each step's object in declared order
/// 3. Classify each submitted object and append its status
/// 4. Stop at the first step that is not Succeeded
///
/// Passes never wait. A Running step ends the pass with `Ok(false)` and
/// the caller is expected to run another pass later. Every pass
/// resubmits from the first step so earlier objects keep tracking their
/// templates.
pub struct WorkflowEngine {
    /// Submits step objects to the platform
    applicator: Arc<dyn Applicator>,

    /// Classifies submitted objects
    evaluator: StepStatusEvaluator,

    /// Event sender for workflow events
    event_sender: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowEngine {
    /// Create a new engine reading conditions from `status.conditions`
    pub fn new(applicator: Arc<dyn Applicator>) -> Self {
        let (event_sender, _) = broadcast::channel(1024);
        Self {
            applicator,
            evaluator: StepStatusEvaluator::default(),
            event_sender,
        }
    }

    /// Use a different condition reader
    pub fn with_condition_reader(mut self, reader: Arc<dyn ConditionReader>) -> Self {
        self.evaluator = StepStatusEvaluator::new(reader);
        self
    }

    /// Subscribe to workflow events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.event_sender.subscribe()
    }

    /// Run one pass of `app`'s workflow at `revision`
    ///
    /// `objects[i]` is the rendered target of step `i`. Returns:
    /// - `Ok(false)`: a step is still running, run another pass later
    /// - `Ok(true)`: stop; every step succeeded, or a step failed or was
    ///   stopped. Only the step status list tells these apart.
    /// - `Err(_)`: infrastructure failure; status entries appended before
    ///   the failing step are kept
    pub async fn execute_steps(
        &self,
        app: &mut Application,
        revision: &str,
        objects: &[UnstructuredObject],
    ) -> Result<bool> {
        let steps = app.spec.workflow.clone();
        if steps.is_empty() {
            return Ok(true);
        }

        app.validate()?;
        if objects.len() != steps.len() {
            return Err(WorkflowError::ObjectCountMismatch {
                steps: steps.len(),
                objects: objects.len(),
            });
        }

        let app_name = app.metadata.name.clone();
        info!(app = %app_name, revision, steps = steps.len(), "Starting workflow pass");

        app.status.phase = ApplicationPhase::RunningWorkflow;
        app.status.workflow = Vec::new();

        let _ = self.event_sender.send(WorkflowEvent::PassStarted {
            app: app_name.clone(),
            steps: steps.len(),
        });

        for (index, (step, rendered)) in steps.iter().zip(objects).enumerate() {
            let mut object = match prepare_step_object(app, step, index, revision, rendered) {
                Ok(object) => object,
                Err(e) => return Err(self.abort(&app_name, &step.name, "Failed to prepare step object", e)),
            };

            if let Err(e) = self.applicator.apply(&mut object).await {
                return Err(self.abort(&app_name, &step.name, "Failed to apply step object", e));
            }

            let _ = self.event_sender.send(WorkflowEvent::StepSubmitted {
                app: app_name.clone(),
                step: step.name.clone(),
                index,
            });

            let status = match self.evaluator.evaluate(step, &object) {
                Ok(status) => status,
                Err(e) => return Err(self.abort(&app_name, &step.name, "Failed to evaluate step", e)),
            };
            let phase = status.phase;
            app.status.workflow.push(status);

            let _ = self.event_sender.send(WorkflowEvent::StepEvaluated {
                app: app_name.clone(),
                step: step.name.clone(),
                index,
                phase,
            });

            match phase {
                WorkflowStepPhase::Succeeded => {
                    debug!(app = %app_name, step = %step.name, index, "Step succeeded");
                }
                WorkflowStepPhase::Running => {
                    info!(app = %app_name, step = %step.name, index, "Step still running");
                    return Ok(self.finish(app_name, false));
                }
                WorkflowStepPhase::Failed | WorkflowStepPhase::Stopped => {
                    warn!(app = %app_name, step = %step.name, index, phase = %phase, "Step reached a terminal phase");
                    return Ok(self.finish(app_name, true));
                }
            }
        }

        info!(app = %app_name, "All workflow steps succeeded");
        Ok(self.finish(app_name, true))
    }

    fn abort(&self, app: &str, step: &str, context: &str, e: WorkflowError) -> WorkflowError {
        error!(app = %app, step = %step, error = %e, "{}", context);
        let _ = self.event_sender.send(WorkflowEvent::PassAborted {
            app: app.to_string(),
            step: step.to_string(),
            error: e.to_string(),
        });
        e
    }

    fn finish(&self, app: String, finished: bool) -> bool {
        let _ = self
            .event_sender
            .send(WorkflowEvent::PassFinished { app, finished });
        finished
    }
}

/// Build the object submitted for step `index`
///
/// The rendered object is cloned and given the step's identity. Owner
/// references are replaced, not appended: the Application is the only
/// owner of a step object, whatever the template carried.
fn prepare_step_object(
    app: &Application,
    step: &WorkflowStep,
    index: usize,
    revision: &str,
    rendered: &UnstructuredObject,
) -> Result<UnstructuredObject> {
    let mut object = rendered.clone();
    object.metadata.name = step.name.clone();
    object.metadata.namespace = app.metadata.namespace.clone();
    object.metadata.owner_references = vec![app.controller_reference()];

    WorkflowContext::new(&app.metadata.name, revision, index).annotate(&mut object.metadata)?;

    debug!(
        app = %app.metadata.name,
        step = %step.name,
        index,
        kind = %object.kind(),
        "Prepared step object"
    );
    Ok(object)
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
