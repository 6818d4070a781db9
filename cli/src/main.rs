#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use executor::{Executor, ExecutorConfig, Role, TransportEvent, spawn_transport};
use mesh::{Primitive, Scene};
use protocol::{Envelope, ErrorCode, Message};
use tokio::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not connect to {0}")]
    Connect(String),
    #[error("connection closed before the relay answered")]
    Closed,
    #[error("timed out waiting for the relay")]
    Timeout,
    #[error("invalid message: {0}")]
    Protocol(#[from] protocol::ProtocolError),
    #[error("relay rejected the message: {0}")]
    Rejected(String),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Connect(_) => "E_CONNECT",
            Self::Closed => "E_CLOSED",
            Self::Timeout => "E_TIMEOUT",
            Self::Protocol(e) => e.error_code(),
            Self::Rejected(_) => "E_REJECTED",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mesh-cli", about = "Headless peer for the collaborative mesh relay")]
struct Cli {
    #[arg(long, env = "MESH_SERVER_URL", default_value = "ws://127.0.0.1:3000")]
    server_url: String,

    #[arg(long, env = "MESH_USER")]
    user: String,

    #[arg(long, env = "MESH_SCENE")]
    scene: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    url: String,
    user: String,
    scene: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror the scene and print every message applied to it.
    Watch {
        /// Stop after this many seconds instead of waiting for the relay to close.
        #[arg(long)]
        seconds: Option<u64>,
    },
    Send(SendCommand),
}

#[derive(Args, Debug)]
struct SendCommand {
    /// How long to wait for the relay to echo the command.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: SendSubcommand,
}

#[derive(Subcommand, Debug)]
enum SendSubcommand {
    Create {
        #[arg(value_enum)]
        shape: Shape,
    },
    Name {
        value: String,
    },
    Message {
        text: String,
    },
    /// Any wire message, validated locally before sending.
    Raw {
        json: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Cube,
    Sphere,
    Pyramid,
    Quad,
}

impl From<Shape> for Primitive {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Cube => Self::Cube,
            Shape::Sphere => Self::Sphere,
            Shape::Pyramid => Self::Pyramid,
            Shape::Quad => Self::Quad,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext { url: edit_url(&cli.server_url, &cli.scene, &cli.user), user: cli.user, scene: cli.scene };

    let result = match cli.command {
        Command::Watch { seconds } => run_watch(&ctx, seconds.map(Duration::from_secs)).await,
        Command::Send(send) => run_send(&ctx, send).await,
    };
    if let Err(e) = &result {
        warn!(code = e.error_code(), error = %e, "cli: command failed");
    }
    result
}

fn edit_url(server_url: &str, scene: &str, user: &str) -> String {
    format!(
        "{}/api/edit/{}?user={}",
        server_url.trim_end_matches('/'),
        urlencoding::encode(scene),
        urlencoding::encode(user)
    )
}

// =============================================================================
// WATCH
// =============================================================================

async fn run_watch(ctx: &CliContext, limit: Option<Duration>) -> Result<(), CliError> {
    let config = ExecutorConfig::new(ctx.user.clone()).with_role(Role::Read);
    let mut ex = Executor::new(config, Scene::new(ctx.scene.clone(), ""));
    let (tx, mut events) = spawn_transport(ctx.url.clone());
    let deadline = limit.map(|d| Instant::now() + d);
    let mut opened = false;

    loop {
        let event = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(event) => event,
                Err(_) => break,
            },
            None => events.recv().await,
        };
        let Some(event) = event else { break };
        match event {
            TransportEvent::Opened => {
                opened = true;
                ex.on_open();
                println!("connected to {}", ctx.url);
            }
            TransportEvent::Text(text) => {
                let envelope = match protocol::decode(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(code = e.error_code(), error = %e, "cli: undecodable frame");
                        continue;
                    }
                };
                let line = describe(&envelope);
                let outcome = ex.handle(envelope);
                println!("{line}  [{outcome:?}]");
            }
            TransportEvent::Closed => {
                ex.on_close();
                break;
            }
        }
    }
    drop(tx);

    if !opened {
        return Err(CliError::Connect(ctx.url.clone()));
    }
    print_summary(&ex);
    Ok(())
}

fn describe(envelope: &Envelope) -> String {
    let seq = envelope.seq.map_or_else(|| "-".to_owned(), |s| s.to_string());
    let kind = match &envelope.message {
        Message::Edit(edit) => format!("edit:{}", edit.tool.name()),
        other => other.kind().to_owned(),
    };
    let user = envelope.message.user().unwrap_or("-");
    format!("{seq:>6} {kind:<16} {user}")
}

fn print_summary(ex: &Executor) {
    let scene = ex.scene();
    println!("scene {} \"{}\" users: {}", scene.id, scene.name, scene.users().join(", "));
    for obj in scene.objects() {
        let p = obj.position();
        let holder = scene.lock_holder(&obj.id).unwrap_or("-");
        println!(
            "  {:<12} v={:<4} e={:<4} f={:<4} at ({:.3}, {:.3}, {:.3}) locked by {holder}",
            obj.id,
            obj.vertex_count(),
            obj.edge_count(),
            obj.face_count(),
            p.x,
            p.y,
            p.z,
        );
    }
}

// =============================================================================
// SEND
// =============================================================================

async fn run_send(ctx: &CliContext, send: SendCommand) -> Result<(), CliError> {
    let mut ex = Executor::new(ExecutorConfig::new(ctx.user.clone()), Scene::new(ctx.scene.clone(), ""));
    let expected = match send.command {
        SendSubcommand::Create { shape } => {
            ex.emit_create(shape.into());
            "create"
        }
        SendSubcommand::Name { value } => {
            ex.emit_name(&value);
            "name"
        }
        SendSubcommand::Message { text } => {
            ex.emit_message(&text);
            "message"
        }
        SendSubcommand::Raw { json } => {
            let envelope = protocol::decode(&json)?;
            let kind = envelope.message.kind();
            ex.send_command(envelope.message);
            kind
        }
    };

    let (tx, mut events) = spawn_transport(ctx.url.clone());
    let wait = Duration::from_millis(send.timeout_ms);
    let echo = tokio::time::timeout(wait, async {
        let mut opened = false;
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Opened => {
                    opened = true;
                    for envelope in ex.on_open() {
                        tx.send(envelope).map_err(|_| CliError::Closed)?;
                    }
                }
                TransportEvent::Text(text) => {
                    let Ok(envelope) = protocol::decode(&text) else {
                        debug!(%text, "cli: skipping undecodable frame");
                        continue;
                    };
                    if let Message::Error { message } = &envelope.message {
                        return Err(CliError::Rejected(message.clone()));
                    }
                    if is_echo(&envelope.message, expected, &ctx.user) {
                        return Ok(envelope);
                    }
                }
                TransportEvent::Closed => break,
            }
        }
        Err(if opened { CliError::Closed } else { CliError::Connect(ctx.url.clone()) })
    })
    .await
    .map_err(|_| CliError::Timeout)??;

    let seq = echo.seq.map_or_else(|| "-".to_owned(), |s| s.to_string());
    println!("{expected} relayed with seq {seq}");
    Ok(())
}

/// The first relayed message of the sent kind that speaks for this user, or
/// names no user at all.
fn is_echo(message: &Message, expected: &str, user: &str) -> bool {
    message.kind() == expected && message.user().is_none_or(|u| u == user)
}
