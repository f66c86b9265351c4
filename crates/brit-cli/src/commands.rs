//! # Subcommand Handlers
//!
//! Each handler loads the store file named by the config, runs one
//! operation, prints the result, and returns the process exit code.
//! Mutating handlers rewrite the store file only when the operation
//! succeeds.

use anyhow::{Context, Result};
use clap::Args;

use brit_core::Timestamp;
use brit_policy::{compute_policy, perform, ActionError, WorkflowAction};
use brit_publication::prepublish_check;
use brit_state::{plan_repair, repair_review_state, PublicationStatus, Reviewable};

use crate::config::BritConfig;
use crate::store_file::{object_ref, StoreFile};

/// Exit code when a prepublish check finds blocking issues or an action
/// is refused.
pub const EXIT_BLOCKED: u8 = 2;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list records with this status.
    #[arg(long)]
    pub status: Option<PublicationStatus>,
}

/// Selects one record.
#[derive(Args, Debug, Clone)]
pub struct ObjectArgs {
    /// Model as `<domain>.<model>`, e.g. `soilcom.collection`.
    #[arg(long)]
    pub model: String,
    /// Record id.
    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[command(flatten)]
    pub object: ObjectArgs,
    /// Acting user id; anonymous when omitted.
    #[arg(long)]
    pub user: Option<String>,
    /// Compute as seen from a review screen.
    #[arg(long)]
    pub review_mode: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub object: ObjectArgs,
    /// Intended status; enables the needs-sync report.
    #[arg(long)]
    pub target: Option<PublicationStatus>,
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    #[command(flatten)]
    pub object: ObjectArgs,
    /// Acting user id.
    #[arg(long)]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Report repairs without writing them.
    #[arg(long)]
    pub dry_run: bool,
}

fn load_store(config: &BritConfig) -> Result<StoreFile> {
    let mut file = StoreFile::load(&config.store)?;
    file.assign_default_owner(&config.default_owner()?);
    Ok(file)
}

/// `brit list`
pub fn run_list(args: &ListArgs, config: &BritConfig) -> Result<u8> {
    let file = load_store(config)?;
    let mut rows: Vec<_> = file
        .records
        .iter()
        .filter(|r| args.status.map_or(true, |s| r.status() == s))
        .collect();
    rows.sort_by_key(|r| r.object_ref());

    if rows.is_empty() {
        println!("No records found.");
        return Ok(0);
    }
    println!("Records ({}):", rows.len());
    for r in rows {
        println!("  {}: {} [{}] owner={}", r.object_ref(), r.name, r.status(), r.owner);
    }
    Ok(0)
}

/// `brit policy`
pub fn run_policy(args: &PolicyArgs, config: &BritConfig) -> Result<u8> {
    let file = load_store(config)?;
    let target = object_ref(&args.object.model, &args.object.id)?;
    let user = file.user(args.user.as_deref())?;
    let store = file.to_store();
    let object = store
        .get(&target)
        .with_context(|| format!("object not found: {target}"))?;

    let policy = compute_policy(&user, &object, args.review_mode);
    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(0)
}

/// `brit check`
pub fn run_check(args: &CheckArgs, config: &BritConfig) -> Result<u8> {
    let file = load_store(config)?;
    let registry = config.registry()?;
    let target = object_ref(&args.object.model, &args.object.id)?;
    let store = file.to_store();
    let object = store
        .get(&target)
        .with_context(|| format!("object not found: {target}"))?;

    let report = prepublish_check(&store, &registry, &object, args.target)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_ready() {
        Ok(0)
    } else {
        for line in report.checklist() {
            tracing::warn!(object = %target, "{line}");
        }
        Ok(EXIT_BLOCKED)
    }
}

/// `brit submit|withdraw|approve|reject|archive`
pub fn run_action(action: WorkflowAction, args: &ActionArgs, config: &BritConfig) -> Result<u8> {
    let mut file = load_store(config)?;
    let registry = config.registry()?;
    let target = object_ref(&args.object.model, &args.object.id)?;
    let user = file.user(Some(&args.user))?;
    let mut store = file.to_store();

    match perform(&mut store, &registry, &user, &target, action) {
        Ok(outcome) => {
            file.set_records(&store);
            file.save(&config.store)?;
            println!("OK: {action} {target} -> {}", outcome.status);
            for changed in &outcome.cascade.changed {
                println!("  cascaded {changed} -> {}", outcome.cascade.target);
            }
            Ok(0)
        }
        Err(ActionError::Blocked(report)) => {
            println!("BLOCKED: {target} cannot be published");
            for line in report.checklist() {
                println!("  - {line}");
            }
            Ok(EXIT_BLOCKED)
        }
        Err(e @ ActionError::PermissionDenied { .. }) => {
            println!("DENIED: {e}");
            Ok(EXIT_BLOCKED)
        }
        Err(e) => Err(e).with_context(|| format!("{action} failed")),
    }
}

/// `brit repair`
pub fn run_repair(args: &RepairArgs, config: &BritConfig) -> Result<u8> {
    let mut file = load_store(config)?;
    let now = Timestamp::now();
    let mut repaired = 0usize;

    for record in &mut file.records {
        let object = record.object_ref();
        let actions = if args.dry_run {
            plan_repair(record.review_state(), now)
        } else {
            repair_review_state(record.review_state_mut(), now)
        };
        if actions.is_empty() {
            continue;
        }
        repaired += 1;
        for action in &actions {
            if args.dry_run {
                println!("  would {action} on {object}");
            } else {
                tracing::info!(%object, %action, "repaired status drift");
                println!("  {action} on {object}");
            }
        }
    }

    if repaired > 0 && !args.dry_run {
        file.save(&config.store)?;
    }
    let verb = if args.dry_run { "need repair" } else { "repaired" };
    println!("{repaired} record(s) {verb}");
    Ok(0)
}
