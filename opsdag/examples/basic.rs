// examples/basic.rs

//! Webserver deployment plan built from functional tasks.
//!
//! Run with: `cargo run --example basic`

use anyhow::Result;
use opsdag::{Outcome, Plan};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    opsdag::logging::init_logging(None)?;

    let mut plan = Plan::new();

    let create_user = plan.add_fn_task("create-user", |_cancel| async {
        Ok(Outcome::new(true))
    });

    let install_nginx = plan.add_fn_task("install-nginx", |_cancel| async {
        Ok(Outcome::new(true))
    });

    let configure_dns = plan.add_fn_task("configure-dns", |_cancel| async {
        Ok(Outcome::new(false))
    });

    let start_nginx = plan.add_fn_task("start-nginx", |_cancel| async {
        Ok(Outcome::new(true))
    });

    plan.task_mut(install_nginx).depends_on([create_user]);
    plan.task_mut(start_nginx)
        .depends_on([install_nginx, configure_dns])
        .only_if_changed();

    println!("{}", plan.explain());

    let report = plan.run(CancellationToken::new()).await?;

    println!("{}", report.summary());

    for r in &report.tasks {
        println!(
            "{}: {} (changed={}, duration={:?})",
            r.name, r.status, r.changed, r.duration
        );
    }

    Ok(())
}
