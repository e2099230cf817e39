//! Replays a recorded message stream against a simulated desktop.
//!
//! A script seeds the simulation (monitors, windows, desktops) and lists the
//! messages in arrival order. The messages are pushed through the real
//! channel by a producer thread and consumed by the real dispatch loop, so a
//! replay exercises the same path as live operation and ends with a state
//! snapshot for inspection.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::thread;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::actor;
use crate::actor::wm_controller::{Message, WmController};
use crate::common::config::Config;
use crate::model::StateSnapshot;
use crate::sys::simulated::{SimVirtualDesktops, SimWindowServer, Simulation};

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplayScript {
    pub desktop: Simulation,
    pub messages: Vec<Message>,
}

pub fn load(path: &Path) -> anyhow::Result<ReplayScript> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read replay script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse replay script {}", path.display()))
}

pub fn replay(config: Config, script: ReplayScript) -> anyhow::Result<StateSnapshot> {
    let message_count = script.messages.len();
    let shared = script.desktop.share();
    let mut controller = WmController::new(
        config,
        SimWindowServer::new(shared.clone()),
        SimVirtualDesktops::new(shared),
    )?;

    let (tx, rx) = actor::channel();
    let producer = thread::spawn(move || {
        for message in script.messages {
            if tx.send(message).is_err() {
                break;
            }
        }
        // Dropping the sender disconnects the channel and ends the loop.
    });

    let shutdown = AtomicBool::new(false);
    controller.run(&rx, &shutdown)?;
    if producer.join().is_err() {
        anyhow::bail!("replay producer thread panicked");
    }

    info!(messages = message_count, "replay finished");
    Ok(controller.snapshot())
}
