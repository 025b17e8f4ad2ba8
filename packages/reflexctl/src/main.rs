use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::time;
use tracing::info;

use reflex_engine::controller::{SessionController, TickEvent};
use reflex_engine::hid::UsbHidTransport;
use reflex_engine::transport::PadTransport;
use reflex_protocol::packets::Packet;
use reflex_protocol::profile::{DeviceProfile, PanelCoord, SensorCalibration, SensorCoord};

#[derive(Parser)]
#[command(version, about = "A CLI for RE:Flex v2 dance pads")]
struct Args {
    #[clap(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// List serial numbers of connected pads
    List,
    /// Read and print the profile stored on a pad
    Read { serial: String },
    /// Push a calibration profile and print the pad's read-back
    Push {
        serial: String,

        /// Trigger threshold applied to every sensor
        #[arg(long, default_value_t = 30)]
        threshold: u8,

        /// Release hysteresis applied to every sensor
        #[arg(long, default_value_t = 5)]
        hysteresis: u8,

        /// Panel keys in panel order (left, down, up, right), '-' to
        /// leave a panel unbound, e.g. "adws" or "a-w-"
        #[arg(long)]
        keys: Option<String>,
    },
    /// Stream live sensor frames as hex lines
    Watch {
        serial: String,

        /// Stop after this many seconds
        #[arg(long, default_value_t = 10)]
        duration: u64,
    },
}

/// Polls the controller until the in-flight config sequence completes.
///
/// The engine itself never times out a sequence; this deadline only bounds
/// the command, and on expiry the pad may still be sitting in config mode.
async fn wait_for_profile<T: PadTransport>(
    controller: &mut SessionController<T>,
) -> anyhow::Result<DeviceProfile> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut poll = time::interval(Duration::from_millis(5));
    while Instant::now() < deadline {
        poll.tick().await;
        match controller.tick() {
            Some(TickEvent::ProfileRead { profile, .. }) => return Ok(profile),
            Some(TickEvent::LinkLost) => anyhow::bail!("pad disconnected during the profile read"),
            _ => {}
        }
    }
    anyhow::bail!("pad did not answer the profile read; it may still be in config mode")
}

fn build_profile(threshold: u8, hysteresis: u8, keys: Option<&str>) -> DeviceProfile {
    let mut profile = DeviceProfile::new();
    let calibration = SensorCalibration::new(threshold, hysteresis);
    for panel in PanelCoord::ALL {
        for sensor in SensorCoord::ALL {
            profile.set_calibration(panel, sensor, calibration);
        }
    }
    if let Some(keys) = keys {
        for (panel, key) in PanelCoord::ALL.into_iter().zip(keys.chars()) {
            profile.set_key(panel, (key != '-').then_some(key));
        }
    }
    profile
}

fn print_profile(profile: &DeviceProfile) {
    for panel in PanelCoord::ALL {
        let key = profile
            .panel(panel)
            .and_then(|p| p.key)
            .map(|k| k.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        println!("{panel:?} (key {key})");
        for sensor in SensorCoord::ALL {
            let calibration = profile
                .panel(panel)
                .map(|p| p.calibration(sensor))
                .unwrap_or_default();
            println!(
                "  {sensor:?}: threshold {} hysteresis {}",
                calibration.threshold, calibration.hysteresis
            );
        }
    }
}

fn hex_line(frame: &Packet) -> String {
    frame
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let transport = UsbHidTransport::new().context("failed to initialise the usb-hid backend")?;
    let mut controller = SessionController::new(transport);

    match args.action {
        Action::List => {
            let pads = controller.pads();
            if pads.is_empty() {
                println!("No pads found.");
            }
            for serial in pads {
                println!("{serial}");
            }
        }
        Action::Read { serial } => {
            controller.connect(&serial).await?;
            let profile = wait_for_profile(&mut controller).await?;
            print_profile(&profile);
            controller.disconnect();
        }
        Action::Push {
            serial,
            threshold,
            hysteresis,
            keys,
        } => {
            controller.connect(&serial).await?;
            wait_for_profile(&mut controller)
                .await
                .context("initial profile read failed")?;

            controller.set_profile(build_profile(threshold, hysteresis, keys.as_deref()));
            if !controller.push_profile().await {
                anyhow::bail!("profile was not sent");
            }
            let profile = wait_for_profile(&mut controller)
                .await
                .context("pad never confirmed the pushed profile")?;
            println!("Pad confirmed profile:");
            print_profile(&profile);
            controller.disconnect();
        }
        Action::Watch { serial, duration } => {
            controller.connect(&serial).await?;
            // Finish the connect handshake so the pad is back in live
            // streaming before we start printing frames.
            wait_for_profile(&mut controller).await?;
            info!(serial, "streaming frames");

            let deadline = Instant::now() + Duration::from_secs(duration);
            let mut poll = time::interval(Duration::from_millis(10));
            let mut last = None;
            while Instant::now() < deadline {
                poll.tick().await;
                match controller.tick() {
                    Some(TickEvent::Frame(frame)) if last != Some(frame) => {
                        last = Some(frame);
                        println!("{}", hex_line(&frame));
                    }
                    Some(TickEvent::LinkLost) => anyhow::bail!("pad disconnected"),
                    _ => {}
                }
            }
            controller.disconnect();
        }
    }

    Ok(())
}
