use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use suffix_engine::{
    BuildGraph, Diagnostic, DiskLookup, LocalVar, NodeId, Plan, Severity, SuffixSession,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "suffix-cli")]
#[command(about = "Resolve implicit suffix-rule sources for make-style targets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Resolve(ResolveArgs),
    Dump(DumpArgs),
    IsTransform(IsTransformArgs),
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    #[arg(long)]
    plan: PathBuf,
    /// Targets to resolve; defaults to the plan's main target.
    #[arg(long = "target")]
    targets: Vec<String>,
    /// Directory files are looked up relative to.
    #[arg(long)]
    dir: Option<PathBuf>,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct DumpArgs {
    #[arg(long)]
    plan: PathBuf,
}

#[derive(clap::Args, Debug)]
struct IsTransformArgs {
    #[arg(long)]
    plan: PathBuf,
    name: String,
}

#[derive(Serialize, Debug)]
struct TargetReport {
    name: String,
    path: Option<String>,
    suffix: Option<String>,
    target: Option<String>,
    prefix: Option<String>,
    archive: Option<String>,
    member: Option<String>,
    implicit_source: Option<String>,
    children: Vec<String>,
    commands: Vec<String>,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("suffix_engine=warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Resolve(args) => resolve_command(args),
        Commands::Dump(args) => dump_command(args),
        Commands::IsTransform(args) => is_transform_command(args),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn load_session(
    plan: &Path,
    dir: Option<PathBuf>,
) -> Result<(SuffixSession, BuildGraph, Option<NodeId>), String> {
    let plan = Plan::load(plan).map_err(|error| error.to_string())?;
    let lookup = DiskLookup::new(dir.unwrap_or_else(|| PathBuf::from(".")));
    let mut session = SuffixSession::new(plan.config.clone()).with_lookup(Arc::new(lookup));
    let mut graph = BuildGraph::new();
    let main = plan
        .apply(&mut session, &mut graph)
        .map_err(|error| error.to_string())?;
    Ok((session, graph, main))
}

fn resolve_command(args: ResolveArgs) -> Result<ExitCode, String> {
    let (mut session, mut graph, main) = load_session(&args.plan, args.dir)?;

    let targets = if args.targets.is_empty() {
        let main = main.ok_or_else(|| "no --target given and the plan has no main target".to_string())?;
        vec![main]
    } else {
        args.targets
            .iter()
            .map(|name| graph.get_or_create(name))
            .collect()
    };

    let mut failed = false;
    for &target in &targets {
        debug!(target = %graph[target].name, "resolving");
        if let Err(error) = session.find_deps(&mut graph, target) {
            eprintln!("error: {error}");
            failed = true;
        }
    }

    print_diagnostics(session.diagnostics());

    let reports: Vec<TargetReport> = targets
        .iter()
        .map(|target| report(&session, &graph, *target))
        .collect();
    if args.json {
        let json = serde_json::to_string_pretty(&reports).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        for report in &reports {
            print_report_text(report);
        }
    }

    if failed || session.has_fatal() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn dump_command(args: DumpArgs) -> Result<ExitCode, String> {
    let (session, _, _) = load_session(&args.plan, None)?;
    print!("{}", session.dump());
    print_diagnostics(session.diagnostics());
    Ok(ExitCode::SUCCESS)
}

fn is_transform_command(args: IsTransformArgs) -> Result<ExitCode, String> {
    let (session, _, _) = load_session(&args.plan, None)?;
    println!("{}", session.is_transform(&args.name));
    Ok(ExitCode::SUCCESS)
}

fn report(session: &SuffixSession, graph: &BuildGraph, target: NodeId) -> TargetReport {
    let node = &graph[target];
    let local = |var: LocalVar| node.vars.local(var).map(str::to_string);
    TargetReport {
        name: node.name.clone(),
        path: node.path.clone(),
        suffix: node
            .suffix
            .map(|suffix| session.suffixes()[suffix].name.clone()),
        target: local(LocalVar::Target),
        prefix: local(LocalVar::Prefix),
        archive: local(LocalVar::Archive),
        member: local(LocalVar::Member),
        implicit_source: graph
            .implicit_source(target)
            .map(|source| graph[source].name.clone()),
        children: node
            .children
            .iter()
            .map(|child| graph[*child].name.clone())
            .collect(),
        commands: node.commands.clone(),
    }
}

fn print_report_text(report: &TargetReport) {
    println!("target: {}", report.name);
    println!("  suffix: {}", report.suffix.as_deref().unwrap_or("<none>"));
    println!("  TARGET: {}", report.target.as_deref().unwrap_or("<unset>"));
    println!("  PREFIX: {}", report.prefix.as_deref().unwrap_or("<unset>"));
    if let Some(archive) = report.archive.as_deref() {
        println!("  ARCHIVE: {archive}");
    }
    if let Some(member) = report.member.as_deref() {
        println!("  MEMBER: {member}");
    }
    println!(
        "  implicit source: {}",
        report.implicit_source.as_deref().unwrap_or("<none>")
    );
    println!("  children: {}", report.children.join(" "));
    for command in &report.commands {
        println!("  \t{command}");
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let severity = match diagnostic.severity {
            Severity::Fatal => "fatal",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        eprintln!("{severity}[{}]: {}", diagnostic.code, diagnostic.message);
    }
}
