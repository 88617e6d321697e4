//! Step status evaluation
//!
//! Turns the workflow-progress condition reported on a submitted object
//! into a step phase. Evaluation is stateless: every pass classifies every
//! step afresh from what the platform currently reports.
//!
//! | Reported condition                         | Phase     |
//! |--------------------------------------------|-----------|
//! | none, or status not `True`                 | Running   |
//! | `True`/`Succeeded`, generation matches     | Succeeded |
//! | `True`/`Succeeded`, generation differs     | Running   |
//! | `True`/`Failed`                            | Failed    |
//! | `True`/`Stopped`                           | Stopped   |
//! | `True`/anything else                       | Running   |

use crate::error::Result;
use crate::reader::{ConditionReader, StatusConditionReader};
use appflow_crd::{
    Condition, ConditionReason, SucceededMessage, TypedReference, UnstructuredObject,
    WorkflowStep, WorkflowStepPhase, WorkflowStepStatus, CONDITION_WORKFLOW_PROGRESS,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifies submitted step objects into step phases
#[derive(Clone)]
pub struct StepStatusEvaluator {
    reader: Arc<dyn ConditionReader>,
}

impl Default for StepStatusEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(StatusConditionReader))
    }
}

impl StepStatusEvaluator {
    pub fn new(reader: Arc<dyn ConditionReader>) -> Self {
        Self { reader }
    }

    /// Evaluate one step against the object as the platform stored it
    ///
    /// The resource reference is read from `submitted`, which must be the
    /// post-submit object so the uid is the one the platform assigned.
    pub fn evaluate(
        &self,
        step: &WorkflowStep,
        submitted: &UnstructuredObject,
    ) -> Result<WorkflowStepStatus> {
        let condition = self
            .reader
            .read_condition(submitted, CONDITION_WORKFLOW_PROGRESS)?;
        let phase = classify(condition.as_ref(), submitted.generation())?;

        debug!(
            step = %step.name,
            generation = submitted.generation(),
            reason = ?condition.as_ref().map(|c| &c.reason),
            phase = %phase,
            "Evaluated step"
        );

        Ok(WorkflowStepStatus {
            name: step.name.clone(),
            step_type: step.step_type.clone(),
            resource_ref: TypedReference {
                api_version: submitted.api_version().to_string(),
                kind: submitted.kind().to_string(),
                name: submitted.name().to_string(),
                uid: submitted.uid().to_string(),
            },
            phase,
        })
    }
}

impl std::fmt::Debug for StepStatusEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepStatusEvaluator").finish_non_exhaustive()
    }
}

/// Map a workflow-progress condition to a phase at the object's `generation`
///
/// A malformed `Succeeded` message is an error, not a phase.
pub fn classify(condition: Option<&Condition>, generation: i64) -> Result<WorkflowStepPhase> {
    let Some(condition) = condition.filter(|c| c.is_true()) else {
        return Ok(WorkflowStepPhase::Running);
    };

    let phase = match &condition.reason {
        ConditionReason::Succeeded => {
            let observed = SucceededMessage::parse(&condition.message)?.observed_generation;
            if observed == generation {
                WorkflowStepPhase::Succeeded
            } else {
                warn!(observed, generation, "Success reported for a stale generation");
                WorkflowStepPhase::Running
            }
        }
        ConditionReason::Failed => WorkflowStepPhase::Failed,
        ConditionReason::Stopped => WorkflowStepPhase::Stopped,
        ConditionReason::Other(_) => WorkflowStepPhase::Running,
    };

    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use appflow_crd::ConditionStatus;
    use serde_json::json;

    fn stored_object(generation: i64) -> UnstructuredObject {
        let mut obj = UnstructuredObject::new("apps/v1", "Deployment").with_name("db");
        obj.metadata.uid = Some("uid-db".to_string());
        obj.metadata.generation = Some(generation);
        obj
    }

    #[test]
    fn test_classify_no_condition() {
        assert_eq!(classify(None, 1).unwrap(), WorkflowStepPhase::Running);
    }

    #[test]
    fn test_classify_not_true() {
        let mut cond = Condition::succeeded(1);
        cond.status = ConditionStatus::False;
        assert_eq!(classify(Some(&cond), 1).unwrap(), WorkflowStepPhase::Running);

        cond.status = ConditionStatus::Unknown;
        assert_eq!(classify(Some(&cond), 1).unwrap(), WorkflowStepPhase::Running);

        let mut failed = Condition::failed("boom");
        failed.status = ConditionStatus::False;
        assert_eq!(classify(Some(&failed), 1).unwrap(), WorkflowStepPhase::Running);
    }

    #[test]
    fn test_classify_generation_fence() {
        let cond = Condition::succeeded(2);
        assert_eq!(classify(Some(&cond), 2).unwrap(), WorkflowStepPhase::Succeeded);
        assert_eq!(classify(Some(&cond), 3).unwrap(), WorkflowStepPhase::Running);
        assert_eq!(classify(Some(&cond), 1).unwrap(), WorkflowStepPhase::Running);
    }

    #[test]
    fn test_classify_terminal_reasons() {
        assert_eq!(
            classify(Some(&Condition::failed("crashloop")), 1).unwrap(),
            WorkflowStepPhase::Failed
        );
        assert_eq!(
            classify(Some(&Condition::stopped("suspended")), 1).unwrap(),
            WorkflowStepPhase::Stopped
        );
    }

    #[test]
    fn test_classify_unknown_reason_is_running() {
        let cond = Condition::workflow_progress(ConditionReason::Other("Paused".to_string()));
        assert_eq!(classify(Some(&cond), 1).unwrap(), WorkflowStepPhase::Running);
    }

    #[test]
    fn test_classify_malformed_success_message() {
        let cond = Condition::workflow_progress(ConditionReason::Succeeded).with_message("ok");
        assert!(matches!(classify(Some(&cond), 1), Err(WorkflowError::Crd(_))));
    }

    #[test]
    fn test_evaluate_reads_live_identity() {
        let mut obj = stored_object(5);
        obj.set_condition(Condition::succeeded(5)).unwrap();

        let step = WorkflowStep::new("db", "apply-component");
        let status = StepStatusEvaluator::default().evaluate(&step, &obj).unwrap();

        assert_eq!(status.name, "db");
        assert_eq!(status.step_type, "apply-component");
        assert_eq!(
            status.resource_ref,
            TypedReference {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                name: "db".to_string(),
                uid: "uid-db".to_string(),
            }
        );
        assert_eq!(status.phase, WorkflowStepPhase::Succeeded);
    }

    #[test]
    fn test_evaluate_propagates_read_errors() {
        let obj = stored_object(1).with_field("status", json!({ "conditions": {} }));
        let step = WorkflowStep::new("db", "apply-component");
        assert!(StepStatusEvaluator::default().evaluate(&step, &obj).is_err());
    }

    #[test]
    fn test_evaluate_with_custom_reader() {
        struct AlwaysStopped;

        impl ConditionReader for AlwaysStopped {
            fn read_condition(
                &self,
                _object: &UnstructuredObject,
                _condition_type: &str,
            ) -> Result<Option<Condition>> {
                Ok(Some(Condition::stopped("maintenance window")))
            }
        }

        let evaluator = StepStatusEvaluator::new(Arc::new(AlwaysStopped));
        let status = evaluator
            .evaluate(&WorkflowStep::new("db", "apply-component"), &stored_object(1))
            .unwrap();
        assert_eq!(status.phase, WorkflowStepPhase::Stopped);
    }
}
