use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use logicgit_sdk::{
    DiffReport, DiskRepository, ExecutionDetail, LogEntry, RepoConfig, Repository, StateChange,
};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let root = cli.repo.as_path();
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Init(args) => cmd_init(root, args),
        Command::Execute(args) => cmd_execute(root, args),
        Command::Log(args) => cmd_log(root, args, json),
        Command::Show(args) => cmd_show(root, args, json),
        Command::Diff(args) => cmd_diff(root, args, json),
        Command::Branch(args) => cmd_branch(root, args),
        Command::Switch(args) => cmd_switch(root, args),
        Command::Export(args) => cmd_export(root, args),
        Command::Config(args) => cmd_config(root, args),
    }
}

fn open(root: &Path) -> anyhow::Result<DiskRepository> {
    Repository::open(root).with_context(|| format!("cannot open repository at {}", root.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(root: &Path, args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.as_deref().map_or_else(|| root.to_path_buf(), |p| root.join(p));
    let repo = Repository::init(&path)?;
    println!("{} Initialized logicgit repository in {}", "✓".green().bold(), path.display().to_string().bold());
    println!("  Branch: {}", repo.current_branch().unwrap_or("(detached)").yellow());
    Ok(())
}

fn cmd_execute(root: &Path, args: ExecuteArgs) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    let outcomes = repo.execute_files(&args.rules, &args.data, args.message())?;
    println!(
        "{} Executed {} on {} record(s)",
        "✓".green().bold(),
        args.rules.display().to_string().bold(),
        outcomes.len()
    );
    for outcome in &outcomes {
        let execution = &outcome.execution;
        let applied = if execution.applied_rules.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            execution.applied_rules.join(", ")
        };
        println!(
            "  {} exec {}  applied: {}  ({}µs)",
            outcome.commit_hash.short_hex().yellow(),
            execution.execution_hash.short_hex().cyan(),
            applied,
            execution.duration_us
        );
        for diagnostic in &execution.diagnostics {
            println!(
                "    {} {} ({}): {}",
                "warning:".yellow().bold(),
                diagnostic.rule_name,
                diagnostic.condition_text.dimmed(),
                diagnostic.message
            );
        }
    }
    if let Some(branch) = repo.current_branch() {
        println!("  Branch: {}", branch.yellow());
    }
    Ok(())
}

fn cmd_log(root: &Path, args: LogArgs, json: bool) -> anyhow::Result<()> {
    let repo = open(root)?;
    let entries = repo.log(args.branch.as_deref(), args.limit)?;
    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }
    for entry in &entries {
        if args.oneline {
            println!("{} {}", entry.commit_hash.short_hex().yellow(), entry.commit.message);
        } else {
            print_log_entry(entry);
        }
    }
    Ok(())
}

fn print_log_entry(entry: &LogEntry) {
    println!("{} {}", "commit".yellow(), entry.commit_hash.to_hex().yellow());
    println!("Execution: {}", entry.commit.execution.short_hex().cyan());
    println!("Author:    {}", entry.commit.author);
    println!("Date:      {}", entry.commit.timestamp.to_rfc3339());
    if let Some(execution) = &entry.execution {
        println!(
            "Rules:     {}  applied: {}",
            execution.rules_source,
            execution.applied_rules.join(", ")
        );
    }
    println!();
    println!("    {}", entry.commit.message);
    println!();
}

fn cmd_show(root: &Path, args: ShowArgs, json: bool) -> anyhow::Result<()> {
    let repo = open(root)?;
    let detail = repo.show(&args.hash)?;
    if json {
        return print_json(&detail);
    }
    print_detail(&detail)
}

fn print_detail(detail: &ExecutionDetail) -> anyhow::Result<()> {
    let execution = &detail.execution;
    println!("{} {}", "execution".yellow(), execution.execution_hash.to_hex().yellow());
    println!("Commit:   {}", execution.commit_hash.to_hex());
    if let Some(parent) = execution.parent_hash {
        println!("Parent:   {}", parent.short_hex());
    }
    println!("Branch:   {}", execution.branch.green());
    println!("Author:   {}", execution.author);
    println!("Date:     {}", execution.timestamp.to_rfc3339());
    println!("Rules:    {} ({})", execution.rules_source, execution.rules_hash.short_hex());
    println!("Input:    {}", execution.input_hash.short_hex());
    println!("Output:   {}", execution.output_hash.short_hex());
    println!("Duration: {}µs", execution.duration_us);
    println!();
    println!("    {}", execution.message);
    println!();

    if detail.audit_trail.is_empty() {
        println!("No rules fired.");
    } else {
        println!("{}", "Audit trail:".bold());
        for entry in &detail.audit_trail {
            println!(
                "  {}. {}  when {}",
                entry.position + 1,
                entry.rule_name.green(),
                entry.condition_text.dimmed()
            );
            println!("     then {}", serde_json::to_string(&entry.changes)?);
        }
    }
    if let Some(state) = &detail.final_state {
        println!("{}", "Final state:".bold());
        println!("{}", serde_json::to_string_pretty(state)?);
    }
    Ok(())
}

fn cmd_diff(root: &Path, args: DiffArgs, json: bool) -> anyhow::Result<()> {
    let repo = open(root)?;
    let report = repo.diff(&args.from, &args.to)?;
    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn changed(flag: bool) -> colored::ColoredString {
    if flag {
        "changed".red()
    } else {
        "same".green()
    }
}

fn print_report(report: &DiffReport) {
    println!(
        "Comparing {} → {}",
        report.from.short_hex().yellow(),
        report.to.short_hex().yellow()
    );
    if report.is_identical() {
        println!("  {}", "Executions are identical.".green());
    }
    println!("  Rules:    {}", changed(report.rules_changed));
    println!("  Output:   {}", changed(report.output_changed));
    println!("  Duration: {:+}µs", report.duration_delta_us);
    for rule in &report.added {
        println!("  {} {}", "+".green(), rule.green());
    }
    for rule in &report.removed {
        println!("  {} {}", "-".red(), rule.red());
    }
    if let Some(state) = report.state.as_ref().filter(|s| !s.is_empty()) {
        println!("{}", "Final state:".bold());
        for change in &state.changes {
            match change {
                StateChange::Added { path, value } => println!("  {} {path}: {value}", "+".green()),
                StateChange::Removed { path, value } => println!("  {} {path}: {value}", "-".red()),
                StateChange::Modified { path, old, new } => {
                    println!("  {} {path}: {old} → {new}", "~".yellow())
                }
            }
        }
    }
}

fn cmd_branch(root: &Path, args: BranchArgs) -> anyhow::Result<()> {
    let repo = open(root)?;
    if let Some(name) = &args.name {
        let tip = repo.create_branch(name)?;
        let at = tip.map_or_else(|| "(no commits)".to_string(), |h| h.short_hex());
        println!("Created branch {} at {}", name.yellow(), at);
        return Ok(());
    }
    for branch in repo.branches()? {
        let tip = branch.tip.map(|h| h.short_hex()).unwrap_or_default();
        if branch.is_current {
            println!("* {} {}", branch.name.green().bold(), tip.dimmed());
        } else {
            println!("  {} {}", branch.name, tip.dimmed());
        }
    }
    Ok(())
}

fn cmd_switch(root: &Path, args: SwitchArgs) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    if args.create {
        repo.create_branch(&args.branch)?;
    }
    repo.checkout(&args.branch)?;
    if args.create {
        println!("Created and switched to {}", args.branch.yellow().bold());
    } else {
        println!("Switched to {}", args.branch.yellow().bold());
    }
    Ok(())
}

fn cmd_export(root: &Path, args: ExportArgs) -> anyhow::Result<()> {
    let repo = open(root)?;
    let path = repo.export(&args.hash, args.output.as_deref())?;
    println!("{} Exported to {}", "✓".green().bold(), path.display().to_string().bold());
    Ok(())
}

fn cmd_config(root: &Path, args: ConfigArgs) -> anyhow::Result<()> {
    let mut repo = open(root)?;
    match (args.key, args.value) {
        (Some(key), Some(value)) => {
            repo.set_config(&key, &value)?;
            println!("Set {} = {}", key.bold(), value);
        }
        (Some(key), None) => match repo.config().get(&key) {
            Some(value) => println!("{value}"),
            None => bail!("unknown config key {key:?}; known keys: {}", RepoConfig::KEYS.join(", ")),
        },
        (None, _) => {
            for (key, value) in repo.config().entries() {
                println!("{} = {}", key.bold(), value);
            }
        }
    }
    Ok(())
}
