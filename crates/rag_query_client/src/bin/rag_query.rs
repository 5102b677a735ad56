//! rag-query: terminal client for the RAG query service.
//! Reads config, submits the question from the command line (or every
//! non-empty stdin line, one at a time) and prints each answer to stdout.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rag_query_client::{
    config, Config, InteractionState, QueryClient, QueryInteractionController, Renderer,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rag-query", version, about = "Ask the RAG query service a question")]
struct Args {
    /// Config file (default: ~/.rag-query/config.yaml)
    #[arg(long, env = "RAG_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the endpoint URL from the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Write the effective config to the config path and exit
    #[arg(long)]
    init_config: bool,

    /// Question to ask; read from stdin when omitted
    question: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error: {}", message);
    ExitCode::FAILURE
}

/// Config path and whether the user named it (flag or env) explicitly.
fn resolve_config_path(args: &Args) -> Option<(PathBuf, bool)> {
    match &args.config {
        Some(path) => Some((path.clone(), true)),
        None => config::default_config_path().map(|p| (p, false)),
    }
}

fn load_config(args: &Args) -> Result<Config, String> {
    let mut cfg = match resolve_config_path(args) {
        Some((path, true)) => config::load(&path)
            .map_err(|e| format!("failed to load config from {}: {}", path.display(), e))?,
        Some((path, false)) if path.exists() => config::load(&path)
            .map_err(|e| format!("failed to load config from {}: {}", path.display(), e))?,
        _ => Config::default(),
    };
    if let Some(url) = &args.endpoint {
        cfg.endpoint.url = Some(url.clone());
    }
    Ok(cfg)
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let cfg = match load_config(&args) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    if args.init_config {
        let Some((path, _)) = resolve_config_path(&args) else {
            return fail("unable to determine config path (set --config or RAG_QUERY_CONFIG)");
        };
        if let Err(e) = config::save(&path, &cfg.resolved()) {
            return fail(format!("failed to write config to {}: {}", path.display(), e));
        }
        println!("Wrote {}", path.display());
        return ExitCode::SUCCESS;
    }

    let client = match QueryClient::from_config(&cfg) {
        Ok(c) => c,
        Err(e) => return fail(format!("failed to create HTTP client: {}", e)),
    };
    tracing::debug!(endpoint = client.endpoint(), "using endpoint");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return fail(format!("failed to create runtime: {}", e)),
    };

    let controller = QueryInteractionController::new(Arc::new(client));
    let mut views = controller.subscribe();
    let mut renderer = Renderer::new(io::stdout(), io::stderr());

    let questions: Box<dyn Iterator<Item = io::Result<String>>> = match args.question {
        Some(q) => Box::new(std::iter::once(Ok(q))),
        None => Box::new(io::stdin().lock().lines()),
    };

    let mut asked = 0usize;
    let mut failed = 0usize;
    for question in questions {
        let question = match question {
            Ok(q) => q,
            Err(e) => return fail(format!("failed to read stdin: {}", e)),
        };
        let question = question.trim();
        if question.is_empty() {
            continue;
        }
        controller.update_query_text(question);

        let submission = match controller.begin_submit() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "submission rejected");
                continue;
            }
        };
        asked += 1;
        if let Err(e) = renderer.draw(&views.borrow_and_update()) {
            return fail(e);
        }

        if rt.block_on(submission.finish()) == InteractionState::Failed {
            failed += 1;
        }
        if let Err(e) = renderer.draw(&views.borrow_and_update()) {
            return fail(e);
        }
    }

    if asked == 0 {
        return fail("no question provided (pass it as an argument or on stdin)");
    }
    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
