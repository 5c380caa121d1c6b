//! docgraph-cli: CLI entry point for the docgraph cross-reference engine.

mod commands_analysis;
mod commands_build;
mod commands_query;

use clap::{Parser, Subcommand};
use docgraph_index::ExtractorRegistry;
use docgraph_xref::Project;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "docgraph",
    about = "Keep documentation and source code cross-referenced and consistent"
)]
#[command(version, propagate_version = true)]
struct Cli {
    /// Project root (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the project and write the reference index snapshot
    Build,

    /// Look up an entry in the reference index snapshot
    Query {
        #[command(subcommand)]
        target: QueryTarget,

        /// Print the entry as JSON
        #[arg(long, global = true)]
        json: bool,
    },

    /// Run every validator; exits non-zero when any error is found
    Validate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List exported symbols no documentation reaches
    Orphans {
        /// Print orphans as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect glossary terms
    Terms {
        #[command(subcommand)]
        action: TermsAction,
    },

    /// Inspect the file dependency graph
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },

    /// Show reference index statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum QueryTarget {
    /// A documented feature by id
    Feature { id: String },
    /// A source file by root-relative path
    Code { path: String },
    /// An interface by name
    Interface { name: String },
    /// A term by name or alias
    Term { name: String },
}

#[derive(Subcommand)]
enum TermsAction {
    /// Fuzzy-search terms by name, alias or definition text
    Search {
        /// Search query
        query: String,
    },
    /// List every defined term
    List,
}

#[derive(Subcommand)]
enum GraphAction {
    /// Files a file imports
    Deps { file: String },
    /// Files importing a file
    Dependents { file: String },
    /// Groups of files that import each other
    Cycles,
}

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout stays clean for JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docgraph=info".parse().expect("valid tracing directive")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let project = Project::open(root)?;
    let registry = ExtractorRegistry::with_defaults();

    match cli.command {
        Commands::Build => {
            commands_build::cmd_build(&project, &registry)?;
        }
        Commands::Query { target, json } => match target {
            QueryTarget::Feature { id } => commands_query::cmd_query_feature(&project, &id, json)?,
            QueryTarget::Code { path } => commands_query::cmd_query_code(&project, &path, json)?,
            QueryTarget::Interface { name } => {
                commands_query::cmd_query_interface(&project, &name, json)?
            }
            QueryTarget::Term { name } => commands_query::cmd_query_term(&project, &name, json)?,
        },
        Commands::Validate { json } => {
            let ok = commands_analysis::cmd_validate(&project, &registry, json)?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Orphans { json } => {
            commands_analysis::cmd_orphans(&project, &registry, json)?;
        }
        Commands::Terms { action } => match action {
            TermsAction::Search { query } => {
                commands_analysis::cmd_terms_search(&project, &registry, &query)?;
            }
            TermsAction::List => {
                commands_analysis::cmd_terms_list(&project, &registry)?;
            }
        },
        Commands::Graph { action } => match action {
            GraphAction::Deps { file } => {
                commands_analysis::cmd_graph_deps(&project, &registry, &file, false)?;
            }
            GraphAction::Dependents { file } => {
                commands_analysis::cmd_graph_deps(&project, &registry, &file, true)?;
            }
            GraphAction::Cycles => {
                commands_analysis::cmd_graph_cycles(&project, &registry)?;
            }
        },
        Commands::Stats { json } => {
            commands_query::cmd_stats(&project, json)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

// ── Helpers (shared across modules) ────────────────────────────────────────

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Comma-separated list, or `-` when empty.
pub(crate) fn join_or_dash<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let joined = items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn truncate_str_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_str_long() {
        assert_eq!(truncate_str("hello world", 5), "hello...");
    }

    #[test]
    fn truncate_str_counts_chars() {
        assert_eq!(truncate_str("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn join_or_dash_empty() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(join_or_dash(&empty), "-");
        assert_eq!(join_or_dash(&vec!["a".to_string(), "b".to_string()]), "a, b");
    }

    #[test]
    fn parse_build_with_root() {
        let cli = Cli::try_parse_from(["docgraph", "--root", "/tmp/project", "build"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/project")));
        assert!(matches!(cli.command, Commands::Build));
    }

    #[test]
    fn parse_root_after_subcommand() {
        let cli = Cli::try_parse_from(["docgraph", "validate", "-r", "proj"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("proj")));
        assert!(matches!(cli.command, Commands::Validate { json: false }));
    }

    #[test]
    fn parse_query_feature_json() {
        let cli =
            Cli::try_parse_from(["docgraph", "query", "feature", "checkout", "--json"]).unwrap();
        match cli.command {
            Commands::Query { target, json } => {
                assert!(json);
                match target {
                    QueryTarget::Feature { id } => assert_eq!(id, "checkout"),
                    _ => panic!("Expected Feature target"),
                }
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn parse_query_term() {
        let cli = Cli::try_parse_from(["docgraph", "query", "term", "gizmo"]).unwrap();
        match cli.command {
            Commands::Query {
                target: QueryTarget::Term { name },
                json,
            } => {
                assert_eq!(name, "gizmo");
                assert!(!json);
            }
            _ => panic!("Expected Query term"),
        }
    }

    #[test]
    fn parse_terms_search() {
        let cli = Cli::try_parse_from(["docgraph", "terms", "search", "cache"]).unwrap();
        match cli.command {
            Commands::Terms {
                action: TermsAction::Search { query },
            } => assert_eq!(query, "cache"),
            _ => panic!("Expected Terms search"),
        }
    }

    #[test]
    fn parse_graph_commands() {
        let cli = Cli::try_parse_from(["docgraph", "graph", "deps", "src/a.ts"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Graph {
                action: GraphAction::Deps { .. }
            }
        ));
        let cli = Cli::try_parse_from(["docgraph", "graph", "cycles"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Graph {
                action: GraphAction::Cycles
            }
        ));
    }

    #[test]
    fn parse_orphans_and_stats() {
        let cli = Cli::try_parse_from(["docgraph", "orphans", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Orphans { json: true }));
        let cli = Cli::try_parse_from(["docgraph", "stats"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats { json: false }));
    }

    #[test]
    fn parse_unknown_command_fails() {
        assert!(Cli::try_parse_from(["docgraph", "unknown"]).is_err());
        assert!(Cli::try_parse_from(["docgraph", "query", "feature"]).is_err());
    }
}
