use appflow_crd::{
    Application, ApplicationPhase, Condition, UnstructuredObject, WorkflowContext,
    WorkflowStepPhase,
};
use appflow_workflow::{MemoryApplicator, WorkflowEngine};
use serde_json::json;
use std::sync::Arc;

const NAMESPACE: &str = "staging";

fn application() -> Application {
    Application::new("checkout", NAMESPACE)
        .with_uid("8d0c3c1e-2f57-4f0e-9d1a-1f3f2b7c9a10")
        .with_step("A", "apply-component")
        .with_step("B", "apply-component")
        .with_step("C", "notification")
}

fn rendered_objects() -> Vec<UnstructuredObject> {
    vec![
        UnstructuredObject::new("apps/v1", "Deployment")
            .with_field("spec", json!({ "replicas": 1, "image": "checkout-db:14" })),
        UnstructuredObject::new("apps/v1", "Deployment")
            .with_field("spec", json!({ "replicas": 2, "image": "checkout-api:2.3" })),
        UnstructuredObject::new("v1", "ConfigMap").with_field("data", json!({ "channel": "#deploys" })),
    ]
}

fn phases(app: &Application) -> Vec<(String, WorkflowStepPhase)> {
    app.status
        .workflow
        .iter()
        .map(|s| (s.name.clone(), s.phase))
        .collect()
}

fn entry(name: &str, phase: WorkflowStepPhase) -> (String, WorkflowStepPhase) {
    (name.to_string(), phase)
}

#[tokio::test]
async fn test_three_pass_scenario() {
    let applicator = Arc::new(MemoryApplicator::new());
    let engine = WorkflowEngine::new(applicator.clone());
    let mut app = application();
    let objects = rendered_objects();

    // Pass 1: nothing reported yet for A
    let finished = engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    assert!(!finished);
    assert_eq!(phases(&app), vec![entry("A", WorkflowStepPhase::Running)]);

    // Pass 2: A succeeded at its current generation, B not reported yet
    let generation = applicator.get(NAMESPACE, "A").unwrap().generation();
    applicator
        .set_condition(NAMESPACE, "A", Condition::succeeded(generation))
        .unwrap();

    let finished = engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    assert!(!finished);
    assert_eq!(
        phases(&app),
        vec![
            entry("A", WorkflowStepPhase::Succeeded),
            entry("B", WorkflowStepPhase::Running)
        ]
    );

    // Pass 3: B failed; C is never submitted
    applicator
        .set_condition(NAMESPACE, "B", Condition::failed("readiness probe failed"))
        .unwrap();

    let finished = engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    assert!(finished);
    assert_eq!(
        phases(&app),
        vec![
            entry("A", WorkflowStepPhase::Succeeded),
            entry("B", WorkflowStepPhase::Failed)
        ]
    );
    assert_eq!(app.status.phase, ApplicationPhase::RunningWorkflow);
    assert!(applicator.get(NAMESPACE, "C").is_none());
    assert_eq!(applicator.apply_count(), 1 + 2 + 2);
}

#[tokio::test]
async fn test_repeated_pass_is_idempotent() {
    let applicator = Arc::new(MemoryApplicator::new());
    let engine = WorkflowEngine::new(applicator.clone());
    let objects = rendered_objects();

    let mut app = application();
    engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    applicator.set_condition(NAMESPACE, "A", Condition::succeeded(1)).unwrap();

    let first = engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    let first_status = app.status.clone();

    let second = engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first_status, app.status);
    assert_eq!(applicator.len(), 2);
}

#[tokio::test]
async fn test_stale_success_after_template_change() {
    let applicator = Arc::new(MemoryApplicator::new());
    let engine = WorkflowEngine::new(applicator.clone());
    let mut app = application();
    let mut objects = rendered_objects();

    engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    applicator.set_condition(NAMESPACE, "A", Condition::succeeded(1)).unwrap();

    // New revision changes A's template; the platform bumps its generation
    // but the success report still names generation 1
    objects[0] = UnstructuredObject::new("apps/v1", "Deployment")
        .with_field("spec", json!({ "replicas": 3, "image": "checkout-db:15" }));

    let finished = engine.execute_steps(&mut app, "checkout-v2", &objects).await.unwrap();

    assert!(!finished);
    assert_eq!(applicator.get(NAMESPACE, "A").unwrap().generation(), 2);
    assert_eq!(phases(&app), vec![entry("A", WorkflowStepPhase::Running)]);

    // Once the controller reports the new generation the pass moves on
    applicator.set_condition(NAMESPACE, "A", Condition::succeeded(2)).unwrap();
    engine.execute_steps(&mut app, "checkout-v2", &objects).await.unwrap();
    assert_eq!(
        phases(&app),
        vec![
            entry("A", WorkflowStepPhase::Succeeded),
            entry("B", WorkflowStepPhase::Running)
        ]
    );

    let stored = applicator.get(NAMESPACE, "A").unwrap();
    let ctx = WorkflowContext::decode(&stored.metadata.annotations).unwrap().unwrap();
    assert_eq!(ctx.app_revision, "checkout-v2");
}

#[tokio::test]
async fn test_all_steps_succeed_then_stay_finished() {
    let applicator = Arc::new(MemoryApplicator::new());
    let engine = WorkflowEngine::new(applicator.clone());
    let mut app = application();
    let objects = rendered_objects();

    for step in ["A", "B", "C"] {
        engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
        applicator.set_condition(NAMESPACE, step, Condition::succeeded(1)).unwrap();
    }

    let finished = engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    assert!(finished);
    assert_eq!(app.status.workflow.len(), 3);
    assert!(app
        .status
        .workflow
        .iter()
        .all(|s| s.phase == WorkflowStepPhase::Succeeded));

    for (index, step) in ["A", "B", "C"].iter().enumerate() {
        let stored = applicator.get(NAMESPACE, step).unwrap();
        let ctx = WorkflowContext::decode(&stored.metadata.annotations).unwrap().unwrap();
        assert_eq!(ctx.workflow_index, index);
        assert_eq!(ctx.app_name, "checkout");
        assert_eq!(stored.metadata.owner_references.len(), 1);
        assert_eq!(stored.metadata.owner_references[0].name, "checkout");
    }
}

#[tokio::test]
async fn test_failure_is_not_an_error() {
    let applicator = Arc::new(MemoryApplicator::new());
    let engine = WorkflowEngine::new(applicator.clone());
    let mut app = application();
    let objects = rendered_objects();

    engine.execute_steps(&mut app, "checkout-v1", &objects).await.unwrap();
    applicator.set_condition(NAMESPACE, "A", Condition::failed("image not found")).unwrap();

    let result = engine.execute_steps(&mut app, "checkout-v1", &objects).await;

    assert!(matches!(result, Ok(true)));
    assert_eq!(phases(&app), vec![entry("A", WorkflowStepPhase::Failed)]);
}
