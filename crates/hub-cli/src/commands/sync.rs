//! Pull, push and install command implementations

use std::path::Path;

use colored::Colorize;
use hub_core::{CodeType, InstallTarget, SyncReport, SyncScope, parse_id};

use super::report::{print_json, print_report};
use crate::context::Context;
use crate::error::Result;

/// Output options shared by the sync commands
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub verbose: bool,
}

impl Output {
    fn header(&self, verb: &str, scope: &str) {
        if !self.json {
            println!("{} {verb} {scope}...", "=>".blue().bold());
        }
    }

    fn report(&self, report: &SyncReport) -> Result<()> {
        if self.json {
            print_json(report)
        } else {
            print_report(report, self.verbose);
            Ok(())
        }
    }
}

/// Parse the optional `[type] [id]` arguments into a scope.
pub fn parse_scope(kind: Option<&str>, id: Option<&str>) -> Result<SyncScope> {
    let kind = kind.map(str::parse::<CodeType>).transpose()?;
    let id = id.map(parse_id).transpose()?;
    Ok(SyncScope::new(kind, id)?)
}

/// Run the pull command
pub async fn run_pull(ctx: &Context, scope: SyncScope, output: Output) -> Result<()> {
    let engine = ctx.engine()?;
    output.header("Pulling", &scope.to_string());

    let report = engine.pull(scope).await?;
    output.report(&report)
}

/// Run the push command
pub async fn run_push(ctx: &Context, scope: SyncScope, output: Output) -> Result<()> {
    let engine = ctx.engine()?;
    output.header("Pushing", &scope.to_string());

    let report = engine.push(scope).await?;
    output.report(&report)
}

/// Run the install command
///
/// Local paths are taken relative to the project root.
pub async fn run_install(ctx: &Context, kind: CodeType, path: &str, output: Output) -> Result<()> {
    let target = match InstallTarget::parse(path)? {
        InstallTarget::Local(local) => InstallTarget::Local(ctx.resolve(Path::new(&local))),
        vendored => vendored,
    };

    let engine = ctx.engine()?;
    output.header("Installing", &format!("{kind} {path}"));

    let report = engine.install(kind, target).await?;
    output.report(&report)
}
