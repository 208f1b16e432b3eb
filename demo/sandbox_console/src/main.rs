use clap::{Parser, Subcommand};
use lucidra_core::telemetry::init_tracing;
use lucidra_core::{DashboardPoller, MissionForm, MissionStore, SandboxConfig, SubtaskForm};
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sandbox_console")]
#[command(about = "Drive the Lucidra Sandbox from the terminal")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "LUCIDRA_CONFIG")]
    config: Option<String>,

    /// Sandbox server origin (overrides config file)
    #[arg(long, env = "LUCIDRA_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show progress, missions, advisor roster and badges
    Dashboard,
    /// Show the standalone progress snapshot
    Progress,
    /// List mission templates
    Templates,
    /// Create a mission
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        challenge: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a mission from a template id
    FromTemplate { template_id: String },
    /// Fetch one mission
    Mission { mission_id: String },
    /// Add a subtask to a mission
    AddSubtask {
        mission_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        prompt: String,
        /// Repeat for several constraints
        #[arg(long = "constraint")]
        constraints: Vec<String>,
        #[arg(long, default_value = "")]
        format: String,
        #[arg(long)]
        advisor: Option<String>,
    },
    /// Assign an advisor to a subtask
    Assign {
        mission_id: String,
        subtask_id: String,
        advisor_id: String,
    },
    /// Record a prompt/response iteration on a subtask
    Iterate {
        mission_id: String,
        subtask_id: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        response: String,
        #[arg(long)]
        annotation: Option<String>,
    },
    /// Keep the dashboard fresh and print a summary on every poll
    Watch {
        /// Stop after this many summaries
        #[arg(long)]
        ticks: Option<u64>,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn failure(store: &MissionStore) -> Box<dyn std::error::Error> {
    store
        .error()
        .await
        .unwrap_or_else(|| "Operation failed".to_string())
        .into()
}

/// Load the advisor roster so advisor ids are checked before sending.
/// Without it the server stays the only check.
async fn preload_roster(store: &MissionStore) -> bool {
    if store.refresh_dashboard().await {
        return true;
    }
    let reason = store.error().await.unwrap_or_default();
    warn!(
        target: "sandbox_console",
        error = %reason,
        "Advisor roster unavailable; skipping local advisor check"
    );
    false
}

fn load_config(cli: &Cli) -> SandboxConfig {
    let mut cfg = match &cli.config {
        Some(path) => SandboxConfig::load_from(path),
        None => SandboxConfig::load(),
    };
    if let Some(url) = &cli.api_url {
        cfg.base_url = url.clone();
    }
    cfg
}

#[tokio::main]
async fn main() -> CliResult {
    let _ = dotenvy::dotenv();
    init_tracing("warn,lucidra_core=info,sandbox_console=info");

    let cli = Cli::parse();
    let cfg = load_config(&cli);
    info!(target: "sandbox_console", api = %cfg.api_root(), "Using Sandbox API");

    let store = Arc::new(MissionStore::from_config(&cfg)?);

    match cli.command {
        Command::Dashboard => {
            if !store.refresh_dashboard().await {
                return Err(failure(&store).await);
            }
            print_json(&store.dashboard().await)
        }
        Command::Progress => match store.get_user_progress().await {
            Some(progress) => print_json(&progress),
            None => Err(failure(&store).await),
        },
        Command::Templates => {
            for (id, template) in store.templates().iter() {
                println!("{:<24} {}", id, template.title);
            }
            Ok(())
        }
        Command::Create {
            title,
            description,
            challenge,
            category,
        } => {
            let form = MissionForm {
                title,
                description,
                challenge,
                category,
            };
            match form.submit(&store).await {
                Some(mission) => print_json(&mission),
                None => Err(failure(&store).await),
            }
        }
        Command::FromTemplate { template_id } => {
            match store.create_mission_from_template(&template_id).await {
                Some(mission) => print_json(&mission),
                None => Err(failure(&store).await),
            }
        }
        Command::Mission { mission_id } => match store.get_mission(&mission_id).await {
            Some(mission) => print_json(&mission),
            None => Err(failure(&store).await),
        },
        Command::AddSubtask {
            mission_id,
            title,
            description,
            prompt,
            constraints,
            format,
            advisor,
        } => {
            let mut form = SubtaskForm::new(title, prompt);
            form.description = description;
            form.expected_format = format;
            for c in constraints {
                form.add_constraint(c);
            }
            if let Some(advisor) = advisor {
                preload_roster(&store).await;
                form.assigned_advisor = Some(advisor);
            }
            match form.submit(&store, &mission_id).await {
                Some(subtask) => print_json(&subtask),
                None => Err(failure(&store).await),
            }
        }
        Command::Assign {
            mission_id,
            subtask_id,
            advisor_id,
        } => {
            preload_roster(&store).await;
            if store
                .assign_advisor(&mission_id, &subtask_id, &advisor_id)
                .await
            {
                println!("Assigned {} to subtask {}", advisor_id, subtask_id);
                Ok(())
            } else {
                Err(failure(&store).await)
            }
        }
        Command::Iterate {
            mission_id,
            subtask_id,
            prompt,
            response,
            annotation,
        } => {
            match store
                .add_iteration(
                    &mission_id,
                    &subtask_id,
                    &prompt,
                    &response,
                    annotation.as_deref(),
                )
                .await
            {
                Some(iteration) => print_json(&iteration),
                None => Err(failure(&store).await),
            }
        }
        Command::Watch { ticks } => watch(store, &cfg, ticks).await,
    }
}

async fn watch(store: Arc<MissionStore>, cfg: &SandboxConfig, max_ticks: Option<u64>) -> CliResult {
    let period = cfg.poll_interval();
    let handle = DashboardPoller::new(Arc::clone(&store), period).start();
    let mut printed = 0u64;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(target: "sandbox_console", "Interrupted");
                break;
            }
            _ = tokio::time::sleep(period) => {
                match (store.dashboard().await, store.error().await) {
                    (_, Some(err)) => eprintln!("refresh failed: {}", err),
                    (Some(d), None) => println!(
                        "level {} | {} XP | {} missions | {} advisors available",
                        d.user_progress.level,
                        d.user_progress.total_xp,
                        d.missions.len(),
                        d.available_advisors().count()
                    ),
                    (None, None) => println!("waiting for first dashboard..."),
                }
                printed += 1;
                if max_ticks.is_some_and(|max| printed >= max) {
                    break;
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}
