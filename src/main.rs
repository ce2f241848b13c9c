use clap::{Args, Parser, Subcommand};
use flowwatch::config::Config;
use flowwatch::functions::{
    self, DEFAULT_LIST_LIMIT, DEFAULT_WINDOW_MINUTES, DiscoveryResult, JobNamer,
};
use flowwatch::services::{CloudLoggingClient, DataflowClient, GeminiSummarizer, SystemClock};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "flowwatch", version, about = "Launch Dataflow jobs and triage their errors")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch a flex template job
    Launch {
        /// Template spec location (gs://bucket/path/template.json)
        #[arg(long)]
        template: String,
        /// Template parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Show the current state of a job
    Status { job_id: String },
    /// List the most recently created jobs
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },
    /// Triage job errors from the log store
    #[command(subcommand)]
    Triage(TriageCommand),
}

#[derive(Subcommand)]
enum TriageCommand {
    /// Rank jobs by error volume in the window
    Discover(WindowArgs),
    /// Summarize the errors of one job from the window
    Summarize {
        job_id: String,
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args)]
struct WindowArgs {
    /// Minutes to look back from now
    #[arg(long, default_value_t = DEFAULT_WINDOW_MINUTES)]
    window: u32,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{}", failure_line(&err));
        std::process::exit(1);
    }
}

/// The one line printed for a failed command, cause chain included.
fn failure_line(err: &anyhow::Error) -> String {
    format!("error: {err:#}")
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let scope = &config.scope;
    let clock = SystemClock;

    match cli.cmd {
        Command::Launch { template, params } => {
            let platform =
                DataflowClient::new(config.dataflow_endpoint.clone(), config.access_token.clone())?;
            let namer = JobNamer::new(&config.job_prefix, chrono::Utc::now());
            let parameters: BTreeMap<String, String> = params.into_iter().collect();
            let job =
                functions::launch(&platform, scope, &namer, &clock, &template, parameters).await?;
            emit(cli.json, &job, |job| {
                format!("launched {} ({})", job.id, job.name)
            })?;
        }
        Command::Status { job_id } => {
            let platform =
                DataflowClient::new(config.dataflow_endpoint.clone(), config.access_token.clone())?;
            let report = functions::job_status(&platform, scope, &job_id).await?;
            emit(cli.json, &report, |r| format!("{} ({}): {}", r.id, r.name, r.state))?;
        }
        Command::List { limit } => {
            let platform =
                DataflowClient::new(config.dataflow_endpoint.clone(), config.access_token.clone())?;
            let jobs = functions::list_recent(&platform, scope, limit).await?;
            emit(cli.json, &jobs, |jobs| {
                jobs.iter()
                    .map(|j| {
                        let created = j
                            .created_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "-".to_string());
                        format!("{:<40} {:<40} {:<22} {created}", j.name, j.id, j.state.wire_name())
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::Triage(TriageCommand::Discover(args)) => {
            let log_store = CloudLoggingClient::new(
                config.logging_endpoint.clone(),
                config.access_token.clone(),
                config.max_log_entries,
            )?;
            let result = functions::discover(&log_store, scope, &clock, args.window).await?;
            emit(cli.json, &result, render_discovery)?;
        }
        Command::Triage(TriageCommand::Summarize { job_id, window }) => {
            let log_store = CloudLoggingClient::new(
                config.logging_endpoint.clone(),
                config.access_token.clone(),
                config.max_log_entries,
            )?;
            let summarizer = GeminiSummarizer::new(
                config.summary_endpoint.clone(),
                config.require_api_key()?,
                config.summary_model.clone(),
            )?;
            let result = functions::summarize(
                &log_store,
                &summarizer,
                scope,
                &clock,
                window.window,
                &job_id,
            )
            .await?;
            emit(cli.json, &result, |r| {
                format!(
                    "{} ({} entries, last {} minutes{})\n\n{}",
                    r.job_id,
                    r.log_count,
                    r.time_window_minutes,
                    if r.truncated { ", truncated" } else { "" },
                    r.summary
                )
            })?;
        }
    }
    Ok(())
}

fn render_discovery(result: &DiscoveryResult) -> String {
    match result {
        DiscoveryResult::NoErrors { message, .. }
        | DiscoveryResult::Unattributable { message, .. } => message.clone(),
        DiscoveryResult::PendingSelection {
            candidates,
            unattributed,
            instruction,
            ..
        } => {
            let mut lines: Vec<String> = candidates
                .iter()
                .map(|c| format!("{:<50} {}", c.job_id, c.error_count))
                .collect();
            if *unattributed > 0 {
                lines.push(format!("({unattributed} entries without a job id)"));
            }
            lines.push(String::new());
            lines.push(instruction.clone());
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_line_carries_cause_chain_once() {
        let err = anyhow::anyhow!("permission denied").context("listing jobs failed");
        let line = failure_line(&err);
        assert_eq!(line, "error: listing jobs failed: permission denied");
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn parses_key_value_params() {
        assert_eq!(
            parse_param("query=SELECT a=b FROM t").unwrap(),
            ("query".to_string(), "SELECT a=b FROM t".to_string())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn cli_parses_triage_summarize() {
        let cli = Cli::try_parse_from([
            "flowwatch",
            "--json",
            "triage",
            "summarize",
            "2026-10-19_abc",
            "--window",
            "15",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.cmd,
            Command::Triage(TriageCommand::Summarize { ref job_id, ref window })
                if job_id == "2026-10-19_abc" && window.window == 15
        ));
    }

    #[test]
    fn renders_candidates_with_instruction() {
        let rendered = render_discovery(&DiscoveryResult::PendingSelection {
            time_window_minutes: 60,
            candidates: vec![functions::Candidate {
                job_id: "j1".to_string(),
                error_count: 3,
            }],
            unattributed: 2,
            instruction: "pick one".to_string(),
        });
        assert!(rendered.contains("j1"));
        assert!(rendered.contains("2 entries without a job id"));
        assert!(rendered.ends_with("pick one"));
    }
}
