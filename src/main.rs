//! E.C.H.O. - Entry Point
//!
//! Interactive crisis-negotiation trainer. Sets up the async runtime, picks
//! an oracle (HTTP model if configured, scripted otherwise) and runs a
//! simple read-eval loop over one session.

use clap::Parser;
use echo_crisis::core::config::EchoConfig;
use echo_crisis::core::error::{OracleError, Result};
use echo_crisis::core::types::ScenarioKey;
use echo_crisis::llm::{LlmClient, Oracle, Prompt, ScriptedOracle};
use echo_crisis::persona::PersonaCatalog;
use echo_crisis::pipeline::{has_complication, TurnOrchestrator};
use echo_crisis::report::SessionReport;
use echo_crisis::session::Session;

use std::io::{self, Write};
use std::path::PathBuf;
use tokio::runtime::Runtime;

/// E.C.H.O. - Empathy & Crisis Handling Operative
#[derive(Parser, Debug)]
#[command(name = "echo-crisis")]
#[command(about = "Practice de-escalating a simulated crisis conversation")]
struct Args {
    /// Scenario to start with (ER, School, Customer, or one from --personas)
    #[arg(long, default_value = "ER")]
    scenario: String,

    /// Pipeline configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra or replacement personas (TOML)
    #[arg(long)]
    personas: Option<PathBuf>,

    /// Use the scripted offline oracle even if LLM_API_KEY is set
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Seed for the scripted oracle
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Either a real model or the offline script
enum AnyOracle {
    Remote(LlmClient),
    Offline(ScriptedOracle),
}

impl Oracle for AnyOracle {
    async fn generate(&self, prompt: &Prompt) -> std::result::Result<String, OracleError> {
        match self {
            AnyOracle::Remote(client) => client.generate(prompt).await,
            AnyOracle::Offline(script) => script.generate(prompt).await,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("echo_crisis=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EchoConfig::load(path)?,
        None => EchoConfig::default(),
    };

    let mut catalog = PersonaCatalog::builtin();
    if let Some(path) = &args.personas {
        catalog.merge(PersonaCatalog::load(path)?);
    }

    let oracle = if args.offline {
        AnyOracle::Offline(ScriptedOracle::new(args.seed))
    } else {
        match LlmClient::from_env() {
            Ok(client) => {
                tracing::info!("Using model {}", client.model());
                AnyOracle::Remote(client)
            }
            Err(e) => {
                tracing::warn!("{} - running with the scripted offline oracle", e);
                AnyOracle::Offline(ScriptedOracle::new(args.seed))
            }
        }
    };

    // Create the async runtime for oracle calls
    let rt = Runtime::new()?;

    let mut session = Session::for_scenario(&catalog, &ScenarioKey::new(args.scenario), &config)?;
    let orchestrator = TurnOrchestrator::new(oracle, catalog, config);

    println!("\n=== E.C.H.O. - Crisis Simulator ===");
    print_help(&orchestrator);
    print_brief(&session);

    loop {
        print!("\n[tension {} | {}] > ", session.state().tension(), session.state().heart_rate());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        match input {
            "" => continue,
            "quit" | "q" => break,
            "help" | "h" => print_help(&orchestrator),
            "status" | "s" => print_status(&session),
            "log" => print_log(&session)?,
            "report" => match SessionReport::from_session(&session) {
                Some(report) => println!("{}", report),
                None => println!("No interaction history yet."),
            },
            "reset" => {
                session.reset();
                println!("Simulation reset.");
                print_brief(&session);
            }
            _ if input.starts_with("scenario ") => {
                let key = ScenarioKey::new(input.trim_start_matches("scenario ").trim());
                match Session::for_scenario(orchestrator.catalog(), &key, orchestrator.config()) {
                    Ok(next) => {
                        session = next;
                        print_brief(&session);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            _ => match rt.block_on(session.submit(&orchestrator, input)).cloned() {
                Ok(record) => {
                    if has_complication(&record.complication) {
                        println!("\n!! DIRECTOR INJECTION: {}", record.complication.trim());
                    }
                    if !record.scored {
                        println!("(tension could not be scored this turn)");
                    }
                    println!("\n{}: {}", session.persona().name, record.actor_response.trim());
                }
                Err(e) => println!("Turn failed, nothing changed: {}", e),
            },
        }
    }

    if let Some(report) = SessionReport::from_session(&session) {
        println!("\n{}", report);
    }
    println!("\nGoodbye!");
    Ok(())
}

fn print_help<O: Oracle>(orchestrator: &TurnOrchestrator<O>) {
    let scenarios: Vec<String> = orchestrator
        .catalog()
        .iter()
        .map(|p| p.label())
        .collect();
    println!();
    println!("Commands:");
    println!("  <any text>        - Say something to the persona");
    println!("  status / s        - Show the current state");
    println!("  log               - Show the per-turn agent log");
    println!("  report            - End-of-session performance report");
    println!("  reset             - Restart the current scenario");
    println!("  scenario <key>    - Switch scenario ({})", scenarios.join(", "));
    println!("  quit / q          - Exit");
}

fn print_brief(session: &Session) {
    let persona = session.persona();
    println!();
    println!("Scenario: {}", persona.label());
    if !persona.brief.is_empty() {
        println!("Brief: {}", persona.brief);
    }
    println!("Starting tension: {}", persona.initial_tension);
}

fn print_status(session: &Session) {
    let state = session.state();
    println!();
    println!("--- Turn {} | {} ---", state.turn_count(), session.persona().label());
    println!("Tension:    {}%", state.tension());
    println!("Heart rate: {}", state.heart_rate());
    let trace: Vec<String> = session.trace().map(|t| t.to_string()).collect();
    println!("Trace:      {}", trace.join(" "));
    for line in state.history_tail(6) {
        println!("  {}", line);
    }
}

fn print_log(session: &Session) -> Result<()> {
    if session.log().is_empty() {
        println!("No turns yet.");
        return Ok(());
    }
    let start = session.log().len().saturating_sub(5);
    for record in &session.log()[start..] {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}
