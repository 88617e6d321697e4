//! Workflow passes against a cluster
//!
//! Drives `execute_steps` the way a reconciliation loop would: one pass,
//! or with `--watch` repeated passes until the workflow stops.

use crate::cmd::print_status;
use crate::config::Config;
use crate::manifest::{load_application, load_objects};
use appflow_crd::Application;
use appflow_workflow::{KubeApplicator, WorkflowEngine};
use clap::Args;
use color_eyre::eyre::{bail, Result, WrapErr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Application manifest (YAML)
    #[arg(long)]
    pub app: PathBuf,

    /// Rendered step objects (multi-document YAML)
    #[arg(long)]
    pub objects: PathBuf,

    /// Application revision the objects were rendered at
    #[arg(long)]
    pub revision: String,

    /// Keep running passes until the workflow stops
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Configuration file (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run_workflow(args: RunArgs, mut shutdown: watch::Receiver<()>) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let mut app = load_application(&args.app)?;
    let objects = load_objects(&args.objects)?;

    let applicator = KubeApplicator::try_default()
        .await
        .wrap_err("Failed to connect to Kubernetes")?
        .with_field_manager(&config.field_manager)
        .with_force(config.force_apply);

    if !has_uid(&app) {
        let live_uid = applicator
            .application_uid(app.metadata.namespace.as_deref(), &app.metadata.name)
            .await
            .wrap_err("Failed to look up the Application")?;
        adopt_live_uid(&mut app, live_uid)?;
    }
    let engine = WorkflowEngine::new(Arc::new(applicator));

    let mut passes: u32 = 0;
    loop {
        passes += 1;
        let finished = engine
            .execute_steps(&mut app, &args.revision, &objects)
            .await
            .wrap_err_with(|| format!("Workflow pass {} failed", passes))?;
        print_status(&app);

        if finished {
            return report_outcome(&app);
        }
        if !args.watch {
            println!("Workflow still running");
            return Ok(());
        }
        if let Some(max) = config.max_passes {
            if passes >= max {
                bail!("Workflow still running after {} passes", passes);
            }
        }

        info!(
            app = %app.metadata.name,
            pass = passes,
            requeue_secs = config.requeue_interval_secs,
            "Workflow not finished, requeueing"
        );
        tokio::select! {
            _ = tokio::time::sleep(config.requeue_interval()) => {}
            _ = shutdown.changed() => {
                info!("Shutdown requested, stopping workflow passes");
                return Ok(());
            }
        }
    }
}

fn has_uid(app: &Application) -> bool {
    app.metadata.uid.as_deref().is_some_and(|uid| !uid.is_empty())
}

/// Copy the UID of the live Application into a manifest that lacks one
///
/// Step objects are owned by the Application, so there is nothing to run
/// until it exists in the cluster.
fn adopt_live_uid(app: &mut Application, live_uid: Option<String>) -> Result<()> {
    match live_uid.filter(|uid| !uid.is_empty()) {
        Some(uid) => {
            info!(app = %app.metadata.name, uid = %uid, "Using UID of the live Application");
            app.metadata.uid = Some(uid);
            Ok(())
        }
        None => bail!(
            "Application '{}' has no UID and was not found in namespace '{}'; create it before running its workflow",
            app.metadata.name,
            app.metadata.namespace.as_deref().unwrap_or("default")
        ),
    }
}

/// A finished pass is either complete or stopped at a terminal step; only
/// the status list says which.
fn report_outcome(app: &Application) -> Result<()> {
    match app.status.workflow.last() {
        Some(last) if last.phase.is_terminal() => {
            bail!("Workflow step '{}' {}", last.name, last.phase)
        }
        _ => {
            println!("Workflow complete");
            Ok(())
        }
    }
}
