use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use coco_observability::{init_tracing, AppMetrics};
use coco_responder::{load_rules, Responder};
use coco_training::{run_training, TrainingInputs};

#[derive(Debug, Parser)]
#[command(name = "cocobot")]
#[command(about = "CocoBot cosmetics assistant: train artifacts and answer queries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct InferenceArgs {
    /// Directory holding the trained artifacts.
    #[arg(long, env = "COCO_ARTIFACTS_DIR", default_value = "artifacts")]
    artifacts: PathBuf,

    /// Rule table; defaults to `<artifacts>/rules.json`, then `rules.json` beside it.
    #[arg(long, env = "COCO_RULES_PATH")]
    rules: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit the intent model and write every artifact.
    Train {
        #[arg(long)]
        intents: PathBuf,
        #[arg(long)]
        entities: PathBuf,
        #[arg(long)]
        rules: PathBuf,
        #[arg(long, default_value = "artifacts")]
        outdir: PathBuf,
    },
    /// Answer one query and print the reply as JSON.
    Ask {
        #[command(flatten)]
        inference: InferenceArgs,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Interactive loop over stdin.
    Chat {
        #[command(flatten)]
        inference: InferenceArgs,
    },
}

fn main() -> Result<()> {
    init_tracing("coco_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            intents,
            entities,
            rules,
            outdir,
        } => {
            let summary = run_training(&TrainingInputs {
                intents_csv: intents,
                entities_jsonl: entities,
                rules_json: rules,
                outdir,
            })?;

            println!("[OK] Training finished.");
            println!("- Saved to: {}", summary.outdir.display());
            match summary.accuracy {
                Some(accuracy) => println!("- Validation accuracy: {accuracy:.3}"),
                None => println!("- Validation accuracy: n/a (too few examples)"),
            }
            if !summary.converged {
                println!("- Warning: optimizer hit its iteration cap before converging");
            }
        }
        Command::Ask { inference, query } => {
            let responder = build_responder(&inference)?;
            let reply = responder.respond(&query.join(" "));
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Chat { inference } => {
            let responder = build_responder(&inference)?;
            run_chat(&responder)?;
        }
    }

    Ok(())
}

fn build_responder(args: &InferenceArgs) -> Result<Responder> {
    let artifacts: &Path = &args.artifacts;
    let table = load_rules(artifacts, args.rules.as_deref()).context("failed loading rules.json")?;
    Responder::from_artifacts(artifacts, table, AppMetrics::shared()).with_context(|| {
        format!(
            "failed loading artifacts from {} (run `cocobot train` first)",
            artifacts.display()
        )
    })
}

fn run_chat(responder: &Responder) -> Result<()> {
    println!("CocoBot chat mode. type 'exit' to quit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        let reply = responder.respond(message);
        println!("\n[{}] {}", reply.intent, reply.reply);
        if !reply.entities.is_empty() {
            println!("entities: {}", reply.entities.join(", "));
        }
        println!();
    }

    Ok(())
}
