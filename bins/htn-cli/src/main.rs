// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `htn`: list, inspect, plan, and execute the bundled HTN domains.
//!
//! Saved preferences (strategy, bounds, seed, log level) are read from the
//! config directory and overridden by flags; `--save` writes the merged
//! result back. Plans go to stdout, logs to stderr.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use htn_app_core::{ConfigService, PlannerPrefs, PrefsPort, Strategy};
use htn_config_fs::FsConfigStore;
use htn_core::{Domain, Listed, Planner, SearchStats, State, Todo};
use htn_domains::{catalog, entry, DomainEntry, Problem};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "htn", author, version, about = "HTN planner over the bundled domains")]
struct Cli {
    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Recursion limit for planning
    #[arg(long, global = true, conflicts_with = "no_depth_limit")]
    max_depth: Option<usize>,
    /// Plan without a recursion limit
    #[arg(long, global = true)]
    no_depth_limit: bool,
    /// Stop after this many expansions
    #[arg(long, global = true)]
    node_budget: Option<usize>,
    /// Seed for randomised commands and generated problems
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Read and write preferences here instead of the user config directory
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Persist the effective preferences
    #[arg(long, global = true)]
    save: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List domains and their problems
    List,
    /// Print a domain's declarations, or one problem's state and todo list
    Show {
        domain: String,
        problem: Option<String>,
    },
    /// Find a plan
    Plan {
        domain: String,
        problem: String,
        /// dfs, gbfs, or astar
        #[arg(long)]
        strategy: Option<Strategy>,
        /// Print search counters
        #[arg(long)]
        stats: bool,
    },
    /// Plan and execute with the domain's commands, replanning on deviations
    Run {
        domain: String,
        problem: String,
        /// Planning attempts before giving up
        #[arg(long)]
        max_replans: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let prefs_store = match &cli.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .map(ConfigService::new)
    .context("open config directory")?;
    let saved = prefs_store.load_prefs().context("load preferences")?;
    let prefs = effective_prefs(&cli, saved);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(prefs.log_level.raised_by(cli.verbose).to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    debug!(?prefs, "effective preferences");

    if cli.save {
        prefs_store.save_prefs(&prefs).context("save preferences")?;
        info!(dir = %prefs_store.store().base().display(), "preferences saved");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &cli.command {
        Command::List => list(&mut out),
        Command::Show { domain, problem } => show(&mut out, &prefs, domain, problem.as_deref()),
        Command::Plan {
            domain,
            problem,
            strategy,
            stats,
        } => {
            let strategy = strategy.unwrap_or(prefs.strategy);
            plan(&mut out, &prefs, domain, problem, strategy, *stats)
        }
        Command::Run {
            domain,
            problem,
            max_replans,
        } => {
            let max_replans = max_replans.unwrap_or(prefs.max_replans);
            run(&mut out, &prefs, domain, problem, max_replans)
        }
    }
}

/// Saved preferences with command-line overrides applied.
fn effective_prefs(cli: &Cli, saved: PlannerPrefs) -> PlannerPrefs {
    let mut prefs = saved;
    if cli.no_depth_limit {
        prefs.max_depth = None;
    } else if cli.max_depth.is_some() {
        prefs.max_depth = cli.max_depth;
    }
    if cli.node_budget.is_some() {
        prefs.node_budget = cli.node_budget;
    }
    if let Some(seed) = cli.seed {
        prefs.seed = seed;
    }
    if let Command::Plan {
        strategy: Some(strategy),
        ..
    } = cli.command
    {
        prefs.strategy = strategy;
    }
    if let Command::Run {
        max_replans: Some(n),
        ..
    } = cli.command
    {
        prefs.max_replans = n;
    }
    prefs
}

fn lookup(domain: &str) -> Result<DomainEntry> {
    entry(domain).ok_or_else(|| anyhow!("unknown domain {domain:?} (try `htn list`)"))
}

fn lookup_problem(entry: &DomainEntry, name: &str, seed: u64) -> Result<Problem> {
    entry
        .problem(name, seed)
        .ok_or_else(|| anyhow!("domain {} has no problem {name:?}", entry.name))
}

fn build(entry: &DomainEntry, seed: u64) -> Result<Domain> {
    entry
        .domain(seed)
        .with_context(|| format!("build domain {}", entry.name))
}

fn list(out: &mut impl Write) -> Result<()> {
    for entry in catalog() {
        let names: Vec<String> = entry.problems(0).into_iter().map(|p| p.name).collect();
        writeln!(out, "{:<22} {}", entry.name, entry.about)?;
        writeln!(out, "{:<22} problems: {}", "", names.join(", "))?;
    }
    Ok(())
}

fn show(out: &mut impl Write, prefs: &PlannerPrefs, domain: &str, problem: Option<&str>) -> Result<()> {
    let entry = lookup(domain)?;
    let Some(name) = problem else {
        write!(out, "{}", build(&entry, prefs.seed)?.summary())?;
        return Ok(());
    };
    let problem = lookup_problem(&entry, name, prefs.seed)?;
    writeln!(out, "{}", problem.state)?;
    writeln!(out, "todo: {}", Listed(&problem.todo))?;
    Ok(())
}

fn zero_heuristic(_: &State, _: &[Todo]) -> f64 {
    0.0
}

fn plan(
    out: &mut impl Write,
    prefs: &PlannerPrefs,
    domain: &str,
    problem: &str,
    strategy: Strategy,
    show_stats: bool,
) -> Result<()> {
    let entry = lookup(domain)?;
    let problem = lookup_problem(&entry, problem, prefs.seed)?;
    let domain = build(&entry, prefs.seed)?;
    let planner = Planner::with_config(&domain, prefs.planner_config());
    info!(domain = entry.name, problem = %problem.name, %strategy, "planning");

    let (found, stats): (_, SearchStats) = match strategy.search_mode() {
        None => planner.find_plan_with_stats(&problem.state, &problem.todo)?,
        Some(mode) => {
            let heuristic = entry.heuristic.unwrap_or(zero_heuristic);
            planner.plan_heuristic_with_stats(&problem.state, &problem.todo, &heuristic, None, mode)?
        }
    };
    let Some(found) = found else {
        writeln!(out, "no plan")?;
        if show_stats {
            writeln!(out, "{stats:?}")?;
        }
        return Ok(());
    };

    if planner.simulate(&problem.state, &found)?.is_none() {
        bail!("plan does not replay from the initial state");
    }
    for call in &found {
        writeln!(out, "{call}")?;
    }
    if show_stats {
        writeln!(
            out,
            "{} step(s), {} expansion(s), {} backtrack(s), depth {}",
            found.len(),
            stats.expansions,
            stats.backtracks,
            stats.max_depth
        )?;
    }
    Ok(())
}

fn run(out: &mut impl Write, prefs: &PlannerPrefs, domain: &str, problem: &str, max_replans: usize) -> Result<()> {
    let entry = lookup(domain)?;
    let problem = lookup_problem(&entry, problem, prefs.seed)?;
    let domain = build(&entry, prefs.seed)?;
    let planner = Planner::with_config(&domain, prefs.planner_config());
    let report = planner.run_lazy_lookahead(&problem.state, &problem.todo, max_replans)?;

    for call in &report.executed {
        writeln!(out, "{call}")?;
    }
    writeln!(
        out,
        "{} after {} attempt(s), {} deviation(s)",
        report.outcome, report.attempts, report.deviations
    )?;
    writeln!(out, "{}", report.state)?;
    Ok(())
}
