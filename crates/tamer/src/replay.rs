//! `tamer replay`: feed a packet capture through the pet inventory manager

use crate::capture::{parse_capture, CaptureRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tamer_protocol::{Direction, Header, MessageHeaders, Packet, PacketSender, ProtocolError};
use tamer_state::{
    Cancellation, InventoryError, ManagerConfig, PetInventory, PetInventoryEvent,
    PetInventoryManager,
};
use tokio::sync::Notify;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tamer - pet inventory mirror for intercepted game sessions")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a capture file and print the mirrored pet inventory
    Replay(ReplayArgs),
}

#[derive(clap::Args, Debug)]
struct ReplayArgs {
    /// Capture file (`in <hex>`, `out <hex>`, `disconnect` per line)
    capture: PathBuf,

    /// How long to wait for the inventory, in milliseconds (0 waits until the
    /// capture ends)
    #[arg(long, default_value = "10000")]
    timeout_ms: u64,

    /// Header id of the incoming pet inventory fragment
    #[arg(long)]
    pet_inventory_header: Option<u16>,

    /// Header id of the incoming pet added notification
    #[arg(long)]
    pet_added_header: Option<u16>,

    /// Header id of the incoming pet removed notification
    #[arg(long)]
    pet_removed_header: Option<u16>,

    /// Header id of the outgoing pet inventory request
    #[arg(long)]
    get_pet_inventory_header: Option<u16>,
}

impl ReplayArgs {
    fn config(&self) -> ManagerConfig {
        let defaults = MessageHeaders::default();
        let headers = MessageHeaders {
            pet_inventory: self
                .pet_inventory_header
                .map(Header)
                .unwrap_or(defaults.pet_inventory),
            pet_added_to_inventory: self
                .pet_added_header
                .map(Header)
                .unwrap_or(defaults.pet_added_to_inventory),
            pet_removed_from_inventory: self
                .pet_removed_header
                .map(Header)
                .unwrap_or(defaults.pet_removed_from_inventory),
            get_pet_inventory: self
                .get_pet_inventory_header
                .map(Header)
                .unwrap_or(defaults.get_pet_inventory),
        };
        ManagerConfig::default()
            .with_headers(headers)
            .with_default_timeout(Duration::from_millis(self.timeout_ms))
    }
}

/// Sender with no server behind it: logs requests instead
#[derive(Debug, Default)]
pub struct LoggingSender {
    sent: AtomicUsize,
    notify: Notify,
}

impl LoggingSender {
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    /// Resolves after the next send (or immediately if one is unobserved)
    pub async fn wait_for_send(&self) {
        self.notify.notified().await
    }
}

#[async_trait]
impl PacketSender for LoggingSender {
    async fn send(&self, packet: Packet) -> Result<(), ProtocolError> {
        info!("Outgoing {} ({} bytes)", packet.header, packet.payload.len());
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
        Ok(())
    }
}

/// Outcome of one replay
#[derive(Debug)]
pub struct ReplayReport {
    pub inventory: Result<PetInventory, InventoryError>,
    pub events: Vec<PetInventoryEvent>,
    pub requests: usize,
}

/// Request the inventory, then play the server's side of the capture.
///
/// With a zero timeout the wait is cancelled once the records run out.
pub async fn replay_records(
    config: ManagerConfig,
    records: Vec<CaptureRecord>,
) -> Result<ReplayReport> {
    let timeout = config.default_timeout;
    let sender = Arc::new(LoggingSender::default());
    let manager = Arc::new(PetInventoryManager::new(sender.clone(), config));

    let events = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    manager.subscribe(move |event| {
        debug!("Event: {:?}", event);
        if let Ok(mut events) = sink.lock() {
            events.push(event.clone());
        }
    });

    let (stop, cancel) = Cancellation::new();
    let waiter = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.get_inventory(timeout, cancel).await }
    });
    sender.wait_for_send().await;

    for record in records {
        match record {
            CaptureRecord::Disconnect => manager.on_disconnected(),
            CaptureRecord::Packet(Direction::Outgoing, packet) => {
                debug!("Skipping captured outgoing {}", packet.header);
            }
            record @ CaptureRecord::Packet(Direction::Incoming, _) => {
                if let Some(mut intercept) = record.into_intercept() {
                    manager.dispatch(&mut intercept);
                    if intercept.is_blocked() {
                        debug!("Blocked {}", intercept.header());
                    }
                }
            }
        }
    }

    if timeout.is_zero() {
        debug!("Capture exhausted; no longer waiting for the inventory");
        stop.cancel();
    }

    let inventory = waiter.await.context("inventory waiter panicked")?;
    let events = events.lock().map(|e| e.clone()).unwrap_or_default();

    Ok(ReplayReport {
        inventory,
        events,
        requests: sender.sent(),
    })
}

pub async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Replay(replay) => {
            let text = tokio::fs::read_to_string(&replay.capture)
                .await
                .with_context(|| format!("reading {}", replay.capture.display()))?;
            let records = parse_capture(&text)?;
            info!("Replaying {} records", records.len());

            let report = replay_records(replay.config(), records).await?;
            print_report(&report);

            report.inventory.map(|_| ()).map_err(Into::into)
        }
    }
}

fn print_report(report: &ReplayReport) {
    println!("requests sent: {}", report.requests);
    println!("events raised: {}", report.events.len());
    match &report.inventory {
        Ok(inventory) => {
            let mut pets = inventory.snapshot();
            pets.sort_by_key(|pet| pet.id);
            println!("pets: {}", pets.len());
            for pet in pets {
                println!(
                    "  {:>10}  {:<24} type {:>3}  breed {:>3}  level {:>2}  #{}",
                    pet.id, pet.name, pet.type_id, pet.breed_id, pet.level, pet.color
                );
            }
        }
        Err(e) => println!("inventory unavailable: {e}"),
    }
}
