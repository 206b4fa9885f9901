use std::io::BufRead;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Reads command lines from stdin on a dedicated thread and forwards them
/// to the render loop. The thread ends when stdin closes; the viewer keeps
/// running without a console in that case.
pub fn spawn_console_reader() -> Result<(Receiver<String>, JoinHandle<()>)> {
    let (tx, rx) = unbounded();
    let handle = thread::Builder::new()
        .name("console-stdin".into())
        .spawn(move || read_lines(tx))
        .map_err(|err| anyhow!("failed to spawn console reader thread: {err}"))?;
    Ok((rx, handle))
}

fn read_lines(tx: Sender<String>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if tx.send(line).is_err() {
                    return;
                }
            }
            Err(err) => {
                debug!(%err, "console input closed");
                return;
            }
        }
    }
}
