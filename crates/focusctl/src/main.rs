//! focusctl - command-line client for focusd

mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use focus_api::{BlockCategory, Command, ResponsePayload, SessionPlan, TargetKind};
use focus_ipc::IpcClient;
use focus_util::{PresetId, SessionId, default_socket_path};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "focusctl")]
#[command(about = "Control focusd focus sessions", long_about = None)]
struct Cli {
    /// Socket path (or set FOCUSD_SOCKET env var)
    #[arg(short, long, env = "FOCUSD_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the current session, active blocks and snoozes
    Status,
    /// Start an ad-hoc focus session
    Start {
        /// What you are focusing on
        goal: String,
        /// Length in minutes
        #[arg(short, long, default_value = "25")]
        minutes: u64,
        /// Application to block (repeatable)
        #[arg(short, long = "app")]
        apps: Vec<String>,
        /// Website to block (repeatable)
        #[arg(short, long = "site")]
        sites: Vec<String>,
        /// Category to block (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<BlockCategory>,
    },
    /// Start a session from a preset, by name or id
    Preset {
        preset: String,
        /// Goal (defaults to the preset name)
        #[arg(short, long)]
        goal: Option<String>,
    },
    Pause,
    Resume,
    Stop,
    /// Add minutes to the running session
    Extend { minutes: u64 },
    /// Let one app or website through for a while
    Snooze {
        target: String,
        /// app or website (guessed from the target when omitted)
        #[arg(short, long)]
        kind: Option<TargetKind>,
        /// Minutes (defaults to the service's snooze length)
        #[arg(long = "for")]
        minutes: Option<u64>,
    },
    /// Manage presets
    Presets {
        #[command(subcommand)]
        action: Option<PresetAction>,
    },
    /// Manage session history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// List block categories and their default targets
    Categories,
    /// List installed applications
    Apps,
    /// Follow service events
    Watch,
    Health,
    Ping,
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    List,
    /// Save a finished session as a preset
    Save { session_id: SessionId },
    Delete { preset_id: PresetId },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    List,
    Delete { session_id: SessionId },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut client = IpcClient::connect(&cli.socket)
        .await
        .with_context(|| format!("Failed to connect to focusd at {:?}", cli.socket))?;

    let json = cli.json;
    let command = match cli.command {
        Commands::Watch => return watch(client, json).await,
        Commands::Status => Command::GetState,
        Commands::Start {
            goal,
            minutes,
            apps,
            sites,
            categories,
        } => Command::StartSession {
            plan: SessionPlan {
                goal,
                duration: Some(minutes_to_duration(minutes)?),
                apps,
                websites: sites,
                categories,
            },
        },
        Commands::Preset { preset, goal } => {
            let preset_id = find_preset(&mut client, &preset).await?;
            Command::StartPreset { preset_id, goal }
        }
        Commands::Pause => Command::Pause,
        Commands::Resume => Command::Resume,
        Commands::Stop => Command::Stop,
        Commands::Extend { minutes } => Command::Extend {
            by: minutes_to_duration(minutes)?,
        },
        Commands::Snooze {
            target,
            kind,
            minutes,
        } => Command::Snooze {
            kind: kind.unwrap_or_else(|| guess_kind(&target)),
            target,
            duration: minutes.map(minutes_to_duration).transpose()?,
        },
        Commands::Presets { action } => match action.unwrap_or(PresetAction::List) {
            PresetAction::List => Command::ListPresets,
            PresetAction::Save { session_id } => Command::SavePresetFromSession { session_id },
            PresetAction::Delete { preset_id } => Command::DeletePreset { preset_id },
        },
        Commands::History { action } => match action.unwrap_or(HistoryAction::List) {
            HistoryAction::List => Command::ListHistory,
            HistoryAction::Delete { session_id } => Command::DeleteHistoryEntry { session_id },
            HistoryAction::Clear => Command::ClearHistory,
        },
        Commands::Categories => Command::ListCategories,
        Commands::Apps => Command::ListInstalledApps,
        Commands::Health => Command::GetHealth,
        Commands::Ping => Command::Ping,
    };

    let payload = match client.call(command).await? {
        Ok(payload) => payload,
        Err(err) => bail!("{} ({:?})", err.message, err.code),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", describe(&payload));
    }
    Ok(())
}

async fn watch(client: IpcClient, json: bool) -> Result<()> {
    let mut events = client.subscribe().await?;
    loop {
        let event = events.next().await?;
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else if let Some(line) = render::event(&event) {
            println!("{}", line);
        }
        if matches!(event.payload, focus_api::EventPayload::Shutdown) {
            return Ok(());
        }
    }
}

async fn find_preset(client: &mut IpcClient, query: &str) -> Result<PresetId> {
    if let Ok(id) = query.parse::<PresetId>() {
        return Ok(id);
    }

    let presets = match client.call(Command::ListPresets).await? {
        Ok(ResponsePayload::Presets { presets }) => presets,
        Ok(other) => bail!("Unexpected response: {:?}", other),
        Err(err) => bail!("{}", err.message),
    };

    presets
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(query))
        .map(|p| p.id)
        .with_context(|| format!("No preset named {:?}", query))
}

fn minutes_to_duration(minutes: u64) -> Result<Duration> {
    if minutes == 0 {
        bail!("Minutes must be positive");
    }
    Ok(Duration::from_secs(minutes * 60))
}

/// Anything with a dot that is not an `.app` bundle is a website
fn guess_kind(target: &str) -> TargetKind {
    let lower = target.to_ascii_lowercase();
    if lower.contains("://") || (lower.contains('.') && !lower.ends_with(".app")) {
        TargetKind::Website
    } else {
        TargetKind::App
    }
}

fn describe(payload: &ResponsePayload) -> String {
    let now = focus_util::now();
    match payload {
        ResponsePayload::State(snapshot) => render::state(snapshot, now),
        ResponsePayload::Session(info) => render::session(info),
        ResponsePayload::Stopped { session } => match session {
            Some(info) => format!("Stopped\n{}", render::session(info)),
            None => "Stopped\n".into(),
        },
        ResponsePayload::Snoozed { entry } => format!(
            "Snoozed {} {} until {}\n",
            entry.kind,
            entry.target,
            entry.expires_at.format("%H:%M:%S")
        ),
        ResponsePayload::Extended { new_end } => match new_end {
            Some(end) => format!("Session now ends at {}\n", end.format("%H:%M:%S")),
            None => "Extended\n".into(),
        },
        ResponsePayload::Presets { presets } => render::presets(presets),
        ResponsePayload::PresetSaved { preset } => {
            format!("Saved preset {} ({})\n", preset.name, preset.id)
        }
        ResponsePayload::PresetDeleted => "Preset deleted\n".into(),
        ResponsePayload::History { sessions } => render::history(sessions),
        ResponsePayload::HistoryEntryDeleted => "History entry deleted\n".into(),
        ResponsePayload::HistoryCleared => "History cleared\n".into(),
        ResponsePayload::Categories { categories } => render::categories(categories),
        ResponsePayload::InstalledApps { apps } => {
            apps.iter().map(|a| format!("{}\n", a)).collect()
        }
        ResponsePayload::Subscribed { client_id } => format!("Subscribed as {}\n", client_id),
        ResponsePayload::Unsubscribed => "Unsubscribed\n".into(),
        ResponsePayload::Health(status) => render::health(status),
        ResponsePayload::Pong => "pong\n".into(),
    }
}
