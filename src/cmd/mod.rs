pub mod run;
pub mod validate;

use appflow_crd::Application;

/// Print the step status list of the latest pass
pub fn print_status(app: &Application) {
    println!("{:<24} {:<10} RESOURCE", "STEP", "PHASE");
    for status in &app.status.workflow {
        let resource = format!("{}/{}", status.resource_ref.kind, status.resource_ref.name);
        println!("{:<24} {:<10} {}", status.name, status.phase.to_string(), resource);
    }
}
