//! Offline manifest validation

use crate::manifest::{load_application, load_objects};
use clap::Args;
use color_eyre::eyre::{bail, Result, WrapErr};
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Application manifest (YAML)
    #[arg(long)]
    pub app: PathBuf,

    /// Rendered step objects (multi-document YAML)
    #[arg(long)]
    pub objects: Option<PathBuf>,
}

pub fn run_validate(args: ValidateArgs) -> Result<()> {
    let app = load_application(&args.app)?;
    app.validate().wrap_err("Application is invalid")?;
    debug!(app = %app.metadata.name, "Application manifest parsed");

    println!("Application: {}", app.metadata.name);
    println!("Steps: {}", app.steps().len());
    for (i, step) in app.steps().iter().enumerate() {
        println!("  {}. {} ({})", i + 1, step.name, step.step_type);
    }

    if let Some(path) = &args.objects {
        let objects = load_objects(path)?;
        if objects.len() != app.steps().len() {
            bail!(
                "Workflow has {} steps but {} rendered objects were supplied",
                app.steps().len(),
                objects.len()
            );
        }
        println!("Objects: {}", objects.len());
    }

    println!("Status: Valid");
    Ok(())
}
