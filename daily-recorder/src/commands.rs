//! CLI command definitions and execution.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use dailyrec::api::{
    CreateRoomRequest, RoomPrivacy, RoomProperties, WebhookRequest,
};
use dailyrec::token::{mint_meeting_token, TokenOptions, DEFAULT_TOKEN_TTL_SECS};
use dailyrec::webhook::event::{RECORDING_ERROR, RECORDING_READY, RECORDING_STARTED};
use dailyrec::{Config, DailyClient, SessionStore};

/// Command-line tools for rooms, tokens, recordings and webhook subscriptions
#[derive(Parser, Debug)]
#[command(name = "daily-cli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, inspect and delete rooms
    #[command(subcommand)]
    Room(RoomCommand),

    /// Mint a signed meeting token
    Token(TokenArgs),

    /// Start, stop, list and download cloud recordings
    #[command(subcommand)]
    Record(RecordCommand),

    /// Manage webhook subscriptions
    #[command(subcommand)]
    Webhook(WebhookCommand),

    /// Inspect or reset the saved CLI session
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug)]
pub enum RoomCommand {
    /// Create a room and remember it in the session
    Create {
        /// room name (provider generates one if omitted)
        #[arg(long)]
        name: Option<String>,
        /// make the room private (tokens required to join)
        #[arg(long)]
        private: bool,
        /// expire the room this many seconds from now
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Show a room
    Get { name: String },
    /// List rooms
    List {
        #[arg(short = 'n', long, default_value = "20")]
        limit: u32,
    },
    /// Delete a room (defaults to the session room)
    Delete { name: Option<String> },
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// room the token grants access to (defaults to the session room)
    #[arg(long)]
    pub room: Option<String>,
    #[arg(long)]
    pub user_name: Option<String>,
    #[arg(long)]
    pub user_id: Option<String>,
    /// grant owner privileges
    #[arg(long)]
    pub owner: bool,
    /// token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    pub ttl: i64,
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// Start a cloud recording
    Start {
        #[arg(long)]
        room: Option<String>,
    },
    /// Stop the active recording
    Stop {
        #[arg(long)]
        room: Option<String>,
    },
    /// List recordings
    List {
        #[arg(long)]
        room: Option<String>,
        /// follow pagination to the end
        #[arg(long)]
        all: bool,
        #[arg(short = 'n', long, default_value = "20")]
        limit: u32,
    },
    /// Show recording metadata
    Get { id: Option<String> },
    /// Print a time-limited access link
    Link {
        id: Option<String>,
        #[arg(long)]
        valid_for: Option<u64>,
    },
    /// Download a recording to disk
    Download {
        id: Option<String>,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete a recording
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommand {
    /// Subscribe a callback URL to recording events
    Create {
        url: String,
        /// event types (defaults to started, ready-to-download and error)
        #[arg(long = "events", value_delimiter = ',')]
        events: Vec<String>,
        /// signing secret to use instead of a provider-generated one; its raw bytes are the HMAC key
        #[arg(long)]
        hmac: Option<String>,
    },
    /// List subscriptions
    List,
    /// Show one subscription
    Get { uuid: String },
    /// Update a subscription; also reactivates a FAILED one
    Update {
        uuid: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long = "events", value_delimiter = ',')]
        events: Vec<String>,
    },
    /// Delete a subscription
    Delete { uuid: String },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Print the saved session
    Show,
    /// Forget the saved session
    Clear,
}

/// Everything a command needs.
pub struct CliContext {
    pub config: Config,
    pub client: DailyClient,
    pub session: SessionStore,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve an explicit argument or fall back to the saved session.
fn or_session(explicit: Option<String>, saved: Option<String>, what: &str) -> Result<String> {
    explicit
        .or(saved)
        .ok_or_else(|| anyhow!("no {what} given and none saved in the session"))
}

pub async fn run(command: Command, ctx: &CliContext) -> Result<()> {
    match command {
        Command::Room(cmd) => run_room(cmd, ctx).await,
        Command::Token(args) => run_token(args, ctx),
        Command::Record(cmd) => run_record(cmd, ctx).await,
        Command::Webhook(cmd) => run_webhook(cmd, ctx).await,
        Command::Session(cmd) => run_session(cmd, ctx),
    }
}

async fn run_room(cmd: RoomCommand, ctx: &CliContext) -> Result<()> {
    match cmd {
        RoomCommand::Create {
            name,
            private,
            expires_in,
        } => {
            let request = CreateRoomRequest {
                name,
                privacy: if private {
                    RoomPrivacy::Private
                } else {
                    RoomPrivacy::Public
                },
                properties: RoomProperties {
                    exp: expires_in.map(|secs| Utc::now().timestamp() + secs),
                    enable_recording: Some("cloud".to_string()),
                },
            };

            let room = ctx.client.create_room(&request).await?;
            ctx.session.update(|s| {
                s.room_name = Some(room.name.clone());
                s.room_url = Some(room.url.clone());
                s.recording_id = None;
                s.token = None;
            })?;
            print_json(&room)
        }
        RoomCommand::Get { name } => print_json(&ctx.client.get_room(&name).await?),
        RoomCommand::List { limit } => {
            let rooms = ctx.client.list_rooms(limit).await?;
            for room in &rooms.data {
                println!("{}\t{}", room.name, room.url);
            }
            if let Some(total) = rooms.total_count {
                println!("({} of {} rooms)", rooms.data.len(), total);
            }
            Ok(())
        }
        RoomCommand::Delete { name } => {
            let saved = ctx.session.load()?;
            let name = or_session(name, saved.room_name.clone(), "room")?;
            let deleted = ctx.client.delete_room(&name).await?;
            if saved.room_name.as_deref() == Some(name.as_str()) {
                ctx.session.clear()?;
            }
            print_json(&deleted)
        }
    }
}

fn run_token(args: TokenArgs, ctx: &CliContext) -> Result<()> {
    let room = or_session(args.room, ctx.session.load()?.room_name, "room")?;

    let options = TokenOptions {
        room_name: room,
        is_owner: args.owner,
        user_name: args.user_name,
        user_id: args.user_id,
        ttl_secs: args.ttl,
        enable_recording: args.owner.then(|| "cloud".to_string()),
    };

    let token = mint_meeting_token(&ctx.config.api_key, ctx.config.domain_id.as_deref(), &options)?;
    ctx.session.update(|s| s.token = Some(token.clone()))?;
    info!(room_name = %options.room_name, owner = options.is_owner, "meeting_token_minted");

    println!("{token}");
    Ok(())
}

async fn run_record(cmd: RecordCommand, ctx: &CliContext) -> Result<()> {
    let saved = ctx.session.load()?;

    match cmd {
        RecordCommand::Start { room } => {
            let room = or_session(room, saved.room_name, "room")?;
            let control = ctx.client.start_recording(&room).await?;
            ctx.session.update(|s| {
                s.room_name = Some(room.clone());
                if control.id.is_some() {
                    s.recording_id = control.id.clone();
                }
            })?;
            print_json(&control)
        }
        RecordCommand::Stop { room } => {
            let room = or_session(room, saved.room_name, "room")?;
            print_json(&ctx.client.stop_recording(&room).await?)
        }
        RecordCommand::List { room, all, limit } => {
            let room = room.or(saved.room_name);
            let recordings = if all {
                ctx.client.list_all_recordings(room.as_deref()).await?
            } else {
                ctx.client.list_recordings(room.as_deref(), limit, None).await?.data
            };

            for r in &recordings {
                println!(
                    "{}\t{}\t{}\t{}",
                    r.id,
                    r.room_name.as_deref().unwrap_or("-"),
                    r.status.as_deref().unwrap_or("-"),
                    r.duration.map(|d| format!("{d}s")).unwrap_or_else(|| "-".to_string())
                );
            }
            println!("({} recordings)", recordings.len());
            Ok(())
        }
        RecordCommand::Get { id } => {
            let id = or_session(id, saved.recording_id, "recording id")?;
            print_json(&ctx.client.fetch_recording(&id).await?)
        }
        RecordCommand::Link { id, valid_for } => {
            let id = or_session(id, saved.recording_id, "recording id")?;
            let valid_for = valid_for.unwrap_or(ctx.config.access_link_valid_secs);
            print_json(&ctx.client.fetch_access_link(&id, valid_for).await?)
        }
        RecordCommand::Download { id, out } => {
            let id = or_session(id, saved.recording_id, "recording id")?;
            let downloaded = ctx
                .client
                .download_recording(&id, ctx.config.access_link_valid_secs, &out)
                .await
                .with_context(|| format!("Failed to download recording {id}"))?;
            println!(
                "Saved {} ({} bytes)",
                downloaded.path.display(),
                downloaded.bytes
            );
            Ok(())
        }
        RecordCommand::Delete { id } => print_json(&ctx.client.delete_recording(&id).await?),
    }
}

async fn run_webhook(cmd: WebhookCommand, ctx: &CliContext) -> Result<()> {
    match cmd {
        WebhookCommand::Create { url, events, hmac } => {
            let events = if events.is_empty() {
                vec![
                    RECORDING_STARTED.to_string(),
                    RECORDING_READY.to_string(),
                    RECORDING_ERROR.to_string(),
                ]
            } else {
                events
            };

            let request = WebhookRequest {
                url: Some(url),
                event_types: Some(events),
                hmac,
            };
            let sub = ctx.client.create_webhook(&request).await?;
            print_json(&sub)?;
            if let Some(secret) = &sub.hmac {
                eprintln!("Set DAILY_WEBHOOK_SECRET={secret} on the receiver to verify deliveries");
            }
            Ok(())
        }
        WebhookCommand::List => {
            let subs = ctx.client.list_webhooks().await?;
            for sub in &subs {
                println!(
                    "{}\t{}\t{}\t{}",
                    sub.uuid,
                    sub.state.as_deref().unwrap_or("-"),
                    sub.url,
                    sub.event_types.join(",")
                );
            }
            println!("({} subscriptions)", subs.len());
            Ok(())
        }
        WebhookCommand::Get { uuid } => print_json(&ctx.client.get_webhook(&uuid).await?),
        WebhookCommand::Update { uuid, url, events } => {
            let request = WebhookRequest {
                url,
                event_types: (!events.is_empty()).then_some(events),
                hmac: None,
            };
            print_json(&ctx.client.update_webhook(&uuid, &request).await?)
        }
        WebhookCommand::Delete { uuid } => {
            ctx.client.delete_webhook(&uuid).await?;
            println!("Deleted webhook {uuid}");
            Ok(())
        }
    }
}

fn run_session(cmd: SessionCommand, ctx: &CliContext) -> Result<()> {
    match cmd {
        SessionCommand::Show => print_json(&ctx.session.load()?),
        SessionCommand::Clear => {
            ctx.session.clear()?;
            println!("Cleared session {}", ctx.session.path().display());
            Ok(())
        }
    }
}
