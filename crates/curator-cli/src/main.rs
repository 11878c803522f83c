//! Curator command line
//!
//! Thin adapter over [`curator_core::Coordinator`] using the durable
//! backends: a JSON registry snapshot, a JSONL audit log, and a
//! filesystem archive. Every domain failure maps to a distinct process
//! exit code so producer agents can branch without parsing output.

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use curator_core::{Authorizer, Coordinator, CoordinatorConfig, CoordinatorError};
use curator_registry::{AgentId, FsArchive, JsonRegistry, JsonlAuditLog};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("curator")
        .version(curator_core::VERSION)
        .about("Topic ownership and content lifecycle coordinator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("registry")
                .long("registry")
                .global(true)
                .default_value("curator/registry.json")
                .help("Path to the topic registry snapshot"),
        )
        .arg(
            Arg::new("audit")
                .long("audit")
                .global(true)
                .default_value("curator/audit.jsonl")
                .help("Path to the superseding audit log"),
        )
        .arg(
            Arg::new("archive")
                .long("archive")
                .global(true)
                .default_value("curator/archive")
                .help("Root directory for retired artifacts"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit results as JSON"),
        )
        .subcommand(
            Command::new("consult")
                .about("Ask whether an agent should produce content on a topic")
                .arg(Arg::new("agent").long("agent").required(true))
                .arg(Arg::new("topic").long("topic").required(true))
                .arg(
                    Arg::new("scope")
                        .long("scope")
                        .default_value("")
                        .help("Description of the intended content scope"),
                ),
        )
        .subcommand(
            Command::new("decide-scope")
                .about("Scope-overlap nuance for a consider_necessity consultation")
                .arg(Arg::new("scope").long("scope").required(true))
                .arg(
                    Arg::new("existing-scope")
                        .long("existing-scope")
                        .help("Scope of the existing authoritative content"),
                )
                .arg(
                    Arg::new("force-new")
                        .long("force-new")
                        .action(ArgAction::SetTrue)
                        .help("Permit a parallel artifact despite low overlap"),
                ),
        )
        .subcommand(
            Command::new("claim")
                .about("Claim an unowned topic")
                .arg(Arg::new("topic").long("topic").required(true))
                .arg(Arg::new("agent").long("agent").required(true))
                .arg(
                    Arg::new("justification")
                        .long("justification")
                        .default_value("claimed via cli"),
                ),
        )
        .subcommand(
            Command::new("assign")
                .about("Reassign primary and secondary ownership")
                .arg(Arg::new("topic").long("topic").required(true))
                .arg(Arg::new("primary").long("primary").required(true))
                .arg(
                    Arg::new("secondary")
                        .long("secondary")
                        .action(ArgAction::Append)
                        .help("Secondary owner (repeatable)"),
                )
                .arg(
                    Arg::new("by")
                        .long("by")
                        .conflicts_with("admin")
                        .help("Agent authorizing the reassignment"),
                )
                .arg(
                    Arg::new("admin")
                        .long("admin")
                        .action(ArgAction::SetTrue)
                        .help("Administrative override"),
                ),
        )
        .subcommand(
            Command::new("supersede")
                .about("Retire old artifacts and install a new authority")
                .arg(Arg::new("agent").long("agent").required(true))
                .arg(Arg::new("topic").long("topic").required(true))
                .arg(Arg::new("new-path").long("new-path").required(true))
                .arg(
                    Arg::new("supersedes")
                        .long("supersedes")
                        .action(ArgAction::Append)
                        .help("Path being retired (repeatable)"),
                )
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .default_value("superseded via cli"),
                ),
        )
        .subcommand(
            Command::new("suggest-collaboration")
                .about("Advise an agent on contributing to a topic it does not own")
                .arg(Arg::new("agent").long("agent").required(true))
                .arg(Arg::new("topic").long("topic").required(true)),
        )
        .subcommand(Command::new("list-topics").about("List every registered topic"))
        .subcommand(
            Command::new("topic-detail")
                .about("Full record, derived state, and history for one topic")
                .arg(Arg::new("topic").long("topic").required(true)),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Aggregate registry health report")
                .arg(
                    Arg::new("recent")
                        .long("recent")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Number of recent audit events to include"),
                ),
        )
        .subcommand(
            Command::new("detect-conflicts")
                .about("Scan for contradictions across registry, archive, and log")
                .arg(
                    Arg::new("agent")
                        .long("agent")
                        .action(ArgAction::Append)
                        .help("Known agent roster entry (repeatable)"),
                ),
        )
}

fn open_coordinator(matches: &ArgMatches, config: CoordinatorConfig) -> anyhow::Result<Coordinator> {
    let registry_path = matches.get_one::<String>("registry").unwrap();
    let audit_path = matches.get_one::<String>("audit").unwrap();
    let archive_root = matches.get_one::<String>("archive").unwrap();

    tracing::debug!(
        registry = registry_path.as_str(),
        audit = audit_path.as_str(),
        archive = archive_root.as_str(),
        "opening storage backends"
    );

    let store = JsonRegistry::open(registry_path)
        .with_context(|| format!("opening registry at {registry_path}"))?;
    let audit = JsonlAuditLog::open(audit_path)
        .with_context(|| format!("opening audit log at {audit_path}"))?;

    Ok(Coordinator::new(
        Arc::new(store),
        Arc::new(audit),
        Arc::new(FsArchive::new(archive_root.clone())),
        config,
    ))
}

fn print<T: serde::Serialize>(value: &T, json: bool, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn agent_values(args: &ArgMatches, id: &str) -> BTreeSet<AgentId> {
    args.get_many::<String>(id)
        .unwrap_or_default()
        .map(|s| AgentId::from(s.as_str()))
        .collect()
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let json = matches.get_flag("json");

    match matches.subcommand() {
        Some(("consult", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let agent = AgentId::from(args.get_one::<String>("agent").unwrap().as_str());
            let topic = args.get_one::<String>("topic").unwrap();
            let scope = args.get_one::<String>("scope").unwrap();

            let result = coordinator.consult(&agent, topic, scope)?;
            print(&result, json, |r| {
                println!("recommendation: {}", r.recommendation);
                println!("state: {}", r.state);
                if let Some(owner) = &r.ownership_status.primary_owner {
                    println!("primary owner: {owner}");
                }
                if let Some(existing) = &r.existing_knowledge {
                    println!("existing authority: {}", existing.authority_path);
                }
                println!("rationale: {}", r.rationale);
            })
        }
        Some(("decide-scope", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let advice = coordinator.decide_scope(
                args.get_one::<String>("scope").unwrap(),
                args.get_one::<String>("existing-scope").map(String::as_str),
                args.get_flag("force-new"),
            );
            print(&advice, json, |a| {
                println!("decision: {}", a.decision);
                println!("overlap: {:.2}", a.overlap);
                println!("rationale: {}", a.rationale);
            })
        }
        Some(("claim", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let agent = AgentId::from(args.get_one::<String>("agent").unwrap().as_str());
            let topic = args.get_one::<String>("topic").unwrap();
            let justification = args.get_one::<String>("justification").unwrap();

            let claimed = coordinator.claim(topic, &agent, justification)?;
            print(&claimed, json, |c| {
                println!(
                    "claimed {} for {} (version {})",
                    c.record.name, agent, c.version
                );
            })
        }
        Some(("assign", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let topic = args.get_one::<String>("topic").unwrap();
            let primary = AgentId::from(args.get_one::<String>("primary").unwrap().as_str());
            let secondaries = agent_values(args, "secondary");

            let authorizer = if args.get_flag("admin") {
                Authorizer::Admin
            } else {
                let by = args
                    .get_one::<String>("by")
                    .context("either --by <agent> or --admin is required")?;
                Authorizer::Agent(AgentId::from(by.as_str()))
            };

            let assigned = coordinator.assign(topic, &primary, secondaries, &authorizer)?;
            print(&assigned, json, |a| {
                println!(
                    "assigned {} to {} (version {})",
                    a.record.name, primary, a.version
                );
            })
        }
        Some(("supersede", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let agent = AgentId::from(args.get_one::<String>("agent").unwrap().as_str());
            let topic = args.get_one::<String>("topic").unwrap();
            let new_path = args.get_one::<String>("new-path").unwrap();
            let superseded: Vec<String> = args
                .get_many::<String>("supersedes")
                .unwrap_or_default()
                .cloned()
                .collect();
            let reason = args.get_one::<String>("reason").unwrap();

            let event =
                coordinator.declare_superseding(&agent, topic, new_path, &superseded, reason)?;
            print(&event, json, |e| {
                println!("superseding event {} committed", e.event_id);
                println!("new authority: {}", e.new_authority_path);
                for archive in &e.archives {
                    println!("archived {} -> {}", archive.original_path, archive.archived_path);
                }
            })
        }
        Some(("suggest-collaboration", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let agent = AgentId::from(args.get_one::<String>("agent").unwrap().as_str());
            let topic = args.get_one::<String>("topic").unwrap();

            let suggestion = coordinator.suggest_collaboration(&agent, topic)?;
            print(&suggestion, json, |s| {
                for approach in &s.approaches {
                    println!("- {approach}");
                }
            })
        }
        Some(("list-topics", _)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let topics = coordinator.list_topics()?;
            print(&topics, json, |ts| {
                for versioned in ts {
                    let owner = versioned
                        .record
                        .primary_owner
                        .as_ref()
                        .map_or("unowned".to_string(), ToString::to_string);
                    println!("{} (owner: {owner})", versioned.record.name);
                }
            })
        }
        Some(("topic-detail", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let detail = coordinator.topic_detail(args.get_one::<String>("topic").unwrap())?;
            print(&detail, json, |d| {
                println!("topic: {}", d.record.name);
                println!("state: {}", d.state);
                println!("version: {}", d.version);
                if let Some(owner) = &d.record.primary_owner {
                    println!("primary owner: {owner}");
                }
                if let Some(path) = &d.record.authority_path {
                    println!("authority: {path}");
                }
                println!("superseding events: {}", d.history.len());
            })
        }
        Some(("dashboard", args)) => {
            let recent = *args.get_one::<usize>("recent").unwrap();
            let coordinator = open_coordinator(
                matches,
                CoordinatorConfig::new().with_recent_activity_limit(recent),
            )?;
            let summary = coordinator.dashboard_summary()?;
            print(&summary, json, |s| {
                println!("topics: {}", s.total_topics);
                println!(
                    "fresh: {}  stale: {}  missing: {}  unowned: {}",
                    s.fresh, s.stale, s.missing, s.unowned
                );
                println!("health: {:.0}%", s.health_score * 100.0);
                for topic in &s.topics {
                    println!("  {} [{}]", topic.name, topic.state);
                }
            })
        }
        Some(("detect-conflicts", args)) => {
            let coordinator = open_coordinator(matches, CoordinatorConfig::default())?;
            let roster = agent_values(args, "agent");
            let reports = coordinator.detect_conflicts(&roster)?;
            print(&reports, json, |rs| {
                if rs.is_empty() {
                    println!("no conflicts detected");
                }
                for report in rs {
                    println!("[{}] {} {}", report.kind, report.topic, report.detail);
                }
            })
        }
        _ => unreachable!("subcommand required"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<CoordinatorError>()
            .map_or(1, CoordinatorError::exit_code);
        std::process::exit(code);
    }
}
