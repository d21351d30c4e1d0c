//! Simulator transport
//!
//! Two TCP endpoints carrying newline-delimited JSON: a request/reply
//! connection to the simulator (we send the literal string `request`, it
//! answers with one snapshot per line) and a publish listener where any
//! number of subscribers receive each tick's decisions. A snapshot that
//! fails to arrive within the timeout recycles the simulator connection
//! after a back-off delay; the tick is skipped, never half-answered.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::flock::FlockController;
use crate::snapshot::wire::SnapshotRequest;

/// Addresses and timing for both endpoints.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Simulator request/reply endpoint (we connect out).
    pub simulator_addr: String,
    /// Decision publish endpoint (we listen).
    pub publish_addr: String,
    /// How long to wait for a snapshot before recycling the connection.
    pub snapshot_timeout: Duration,
    /// Delay before reconnecting after a timeout or connection error.
    pub reconnect_backoff: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            simulator_addr: "127.0.0.1:12346".to_string(),
            publish_addr: "127.0.0.1:12345".to_string(),
            snapshot_timeout: Duration::from_secs(10),
            reconnect_backoff: Duration::from_millis(500),
        }
    }
}

/// Run the transport loop until the process is stopped.
pub async fn run(config: TransportConfig, mut controller: FlockController) -> Result<()> {
    let (publish_tx, _) = broadcast::channel::<String>(64);
    tokio::spawn(publish_listener(config.publish_addr.clone(), publish_tx.clone()));

    loop {
        let stream = match TcpStream::connect(&config.simulator_addr).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(addr = %config.simulator_addr, error = %e, "simulator connect failed");
                sleep(config.reconnect_backoff).await;
                continue;
            }
        };
        info!(addr = %config.simulator_addr, "connected to simulator");

        if let Err(e) = tick_loop(&config, stream, &mut controller, &publish_tx).await {
            warn!(error = %e, "simulator connection lost, reconnecting");
        }
        sleep(config.reconnect_backoff).await;
    }
}

/// Request/decide/publish cycles over one simulator connection. Returns on
/// the first timeout or IO error; the caller reconnects.
async fn tick_loop(
    config: &TransportConfig,
    stream: TcpStream,
    controller: &mut FlockController,
    publish_tx: &broadcast::Sender<String>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        write_half.write_all(b"request\n").await?;

        let line = match timeout(config.snapshot_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => {
                warn!("simulator closed the connection");
                return Ok(());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(
                    timeout_ms = config.snapshot_timeout.as_millis() as u64,
                    "no snapshot within timeout, recycling connection"
                );
                return Ok(());
            }
        };

        let request: SnapshotRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                // A garbled line is not worth the connection; skip the tick
                warn!(error = %e, "undecodable snapshot, skipping tick");
                continue;
            }
        };

        let reply = controller.make_decisions(&request);
        let encoded = serde_json::to_string(&reply)?;
        // No subscriber connected yet is fine; decisions are best-effort
        let receivers = publish_tx.send(encoded).unwrap_or(0);
        debug!(
            generation = reply.generation,
            decisions = reply.decisions.len(),
            receivers,
            "published decisions"
        );
    }
}

/// Accept subscriber connections and fan out each published line.
async fn publish_listener(addr: String, publish_tx: broadcast::Sender<String>) {
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(addr = %addr, error = %e, "publish bind failed, decisions will not be published");
            return;
        }
    };
    info!(addr = %addr, "publishing decisions");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(peer = %peer, "subscriber connected");
                tokio::spawn(forward_to_subscriber(stream, publish_tx.subscribe()));
            }
            Err(e) => {
                warn!(error = %e, "subscriber accept failed");
            }
        }
    }
}

async fn forward_to_subscriber(mut stream: TcpStream, mut rx: broadcast::Receiver<String>) {
    loop {
        let line = match rx.recv().await {
            Ok(line) => line,
            // Fell behind; drop the missed ticks and keep following
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                debug!(missed, "subscriber lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };
        if stream.write_all(line.as_bytes()).await.is_err()
            || stream.write_all(b"\n").await.is_err()
        {
            debug!("subscriber disconnected");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::snapshot::wire::DecisionReply;
    use tokio::io::AsyncReadExt;

    fn sample_request(generation: u64) -> String {
        let request = SnapshotRequest {
            generation,
            room_width: 50.0,
            room_height: 50.0,
            goal_position: crate::snapshot::wire::XY { x: 40.0, y: 25.0 },
            goal_diameter: 2.0,
            walls: vec![],
            birds: vec![],
        };
        serde_json::to_string(&request).unwrap()
    }

    #[tokio::test]
    async fn test_tick_loop_requests_and_publishes() {
        let simulator = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let simulator_addr = simulator.local_addr().unwrap();

        // Fake simulator: answer one request, then close
        let sim_task = tokio::spawn(async move {
            let (stream, _) = simulator.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            let req = lines.next_line().await.unwrap().unwrap();
            assert_eq!(req, "request");
            write_half
                .write_all(format!("{}\n", sample_request(7)).as_bytes())
                .await
                .unwrap();
        });

        let config = TransportConfig {
            simulator_addr: simulator_addr.to_string(),
            snapshot_timeout: Duration::from_secs(2),
            ..TransportConfig::default()
        };
        let (publish_tx, mut publish_rx) = broadcast::channel::<String>(8);
        let mut controller = FlockController::new(EngineConfig::default());

        let stream = TcpStream::connect(&config.simulator_addr).await.unwrap();
        let loop_task = tokio::spawn(async move {
            let _ = tick_loop(&config, stream, &mut controller, &publish_tx).await;
        });

        let published = publish_rx.recv().await.unwrap();
        let reply: DecisionReply = serde_json::from_str(&published).unwrap();
        assert_eq!(reply.generation, 7);
        assert!(reply.decisions.is_empty());

        sim_task.await.unwrap();
        loop_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_line() {
        let (publish_tx, _) = broadcast::channel::<String>(8);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        tokio::spawn(publish_listener(addr.to_string(), publish_tx.clone()));

        // Wait for the listener to come up, then subscribe
        let mut subscriber = loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(_) => sleep(Duration::from_millis(20)).await,
            }
        };
        sleep(Duration::from_millis(50)).await;

        publish_tx.send("hello".to_string()).unwrap();

        let mut buf = [0u8; 6];
        subscriber.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello\n");
    }
}
