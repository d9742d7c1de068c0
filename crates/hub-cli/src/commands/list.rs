//! List command: read-only inventory of the hub

use colored::Colorize;
use hub_core::ResourceType;

use super::report::print_json;
use crate::context::Context;
use crate::error::Result;

/// Run the list command
pub async fn run_list(ctx: &Context, kind: ResourceType, json: bool) -> Result<()> {
    let client = ctx.client()?;

    if let Some(code) = kind.code_type() {
        let resources = client.list_code(code).await?;
        if json {
            return print_json(&resources);
        }
        for r in &resources {
            println!("{:>6}  {}  {}", r.id, r.name.green(), r.namespace.dimmed());
        }
        return Ok(());
    }

    match kind {
        ResourceType::Device => {
            let devices = client.list_devices().await?;
            if json {
                return print_json(&devices);
            }
            for d in &devices {
                println!(
                    "{:>6}  {}  {} ({})",
                    d.id,
                    d.name.green(),
                    d.driver,
                    d.source.dimmed()
                );
            }
        }
        _ => {
            let apps = client.list_installed_apps().await?;
            if json {
                return print_json(&apps);
            }
            for a in &apps {
                println!("{:>6}  {}  {}", a.id, a.name.green(), a.app.dimmed());
            }
        }
    }
    Ok(())
}
