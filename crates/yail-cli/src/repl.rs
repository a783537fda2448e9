//! Line-oriented REPL.
//!
//! The interpreter is not `Send`, so it lives on a dedicated thread that
//! reads stdin; each line is one block. The async side waits on the shared
//! return channel and prints every batch as it becomes ready.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;
use tracing::{info, warn};
use yail_core::ReturnChannel;
use yail_runtime::{ConfigError, RuntimeConfig, global};

pub async fn run(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let channel = Arc::new(ReturnChannel::new(config.coercer()?));
    let (done_tx, mut done_rx) = oneshot::channel::<Result<(), ConfigError>>();

    let producer = Arc::clone(&channel);
    let worker = thread::Builder::new().name("yail-repl".into()).spawn(move || {
        let _ = done_tx.send(read_blocks(config, producer));
    })?;

    loop {
        tokio::select! {
            batch = channel.fetch_when_ready() => println!("{}", batch),
            finished = &mut done_rx => {
                if !channel.is_empty() {
                    println!("{}", channel.fetch(true));
                }
                if let Ok(Err(err)) = finished {
                    return Err(err.into());
                }
                break;
            }
        }
    }

    if worker.join().is_err() {
        warn!("REPL worker panicked");
    }
    Ok(())
}

/// Evaluate stdin line by line on this thread's interpreter.
fn read_blocks(config: RuntimeConfig, channel: Arc<ReturnChannel>) -> Result<(), ConfigError> {
    if let Err(err) = global::init_with_channel(config, channel) {
        return match err {
            global::GlobalError::Config(err) => Err(err),
            other => {
                warn!(%other, "could not start interpreter");
                Ok(())
            }
        };
    }
    info!("REPL ready");

    let stdin = std::io::stdin();
    for (n, line) in stdin.lock().lines().enumerate() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        let block_id = (n + 1).to_string();
        match global::with_interpreter(|interp| interp.process_repl_input(&block_id, &line)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(block = %block_id, reason = %err.reason, "block rejected"),
            Err(err) => warn!(%err, "interpreter unavailable"),
        }
    }

    global::teardown();
    Ok(())
}
