//! Fleet demo - two fake robots and an operator session, no hardware.
//!
//! Starts a command listener on an ephemeral port, connects two plain TCP
//! "robots", pushes a few camera settings and a behavior switch, and
//! prints the frames each robot received.
//!
//! Run with:
//! ```sh
//! RUST_LOG=info cargo run --example fleet_demo
//! ```

use setu_relay::config::{ListenerConfig, ListenerMode};
use setu_relay::{Behavior, Dispatcher, RelayServer};
use std::io::Read;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("=== SetuRelay Fleet Demo ===");

    // === 1. Start a command listener on an ephemeral port ===
    let server = RelayServer::new(ListenerConfig {
        name: "demo".to_string(),
        bind: "127.0.0.1:0".to_string(),
        mode: ListenerMode::Command,
        heartbeat_reply: Some(40),
        idle_timeout_secs: 300,
    });
    server.start()?;
    let addr = server.local_addr().expect("listener address");
    log::info!("1. Listener up on {}", addr);

    // === 2. Connect two fake robots ===
    let mut robots = Vec::new();
    for i in 0..2 {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_millis(500)))?;
        log::info!("2. Robot {} connected from {}", i, stream.local_addr()?);
        robots.push(stream);
    }

    // Give the accept loop a moment to register both
    thread::sleep(Duration::from_millis(200));
    log::info!("   Registry sees {} robot(s)", server.registry().len());

    // === 3. Push settings and a behavior switch ===
    let dispatcher = Dispatcher::new(server.registry());
    let delivered = dispatcher.apply_setting("gain", 512)?;
    log::info!("3. gain=512 delivered to {} robot(s)", delivered);
    dispatcher.apply_setting("autoExposure", 0)?;
    dispatcher.set_behavior(Behavior::SearchForBallCard)?;

    // === 4. Show what each robot received ===
    thread::sleep(Duration::from_millis(200));
    for (i, robot) in robots.iter_mut().enumerate() {
        let mut buf = [0u8; 64];
        let mut received = Vec::new();
        while let Ok(n) = robot.read(&mut buf) {
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        let hex: Vec<String> = received.iter().map(|b| format!("{:02X}", b)).collect();
        log::info!("4. Robot {} received: {}", i, hex.join(" "));
    }

    // === 5. Orderly shutdown ===
    server.stop();
    log::info!("5. Demo complete");
    Ok(())
}
