//! End-to-end: real listener, WebSocket viewers, stub collectors.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use hostpulse_api::{AppState, serve};
use hostpulse_core::config::AppConfig;
use hostpulse_core::traits::Collector;
use hostpulse_core::types::{CpuSample, MetricCategory, MetricValue, RamSample};
use hostpulse_core::{AppError, AppResult};
use hostpulse_stream::{EngineState, StreamEngine};
use hostpulse_viewer::client::fetch_window_capacity;
use hostpulse_viewer::{MetricStore, StreamKey, ViewerClient};

#[derive(Debug)]
struct CpuStub;

#[async_trait]
impl Collector for CpuStub {
    fn category(&self) -> MetricCategory {
        MetricCategory::Cpu
    }
    fn name(&self) -> &str {
        "cpu-stub"
    }
    async fn collect(&self) -> AppResult<MetricValue> {
        Ok(MetricValue::Cpu(CpuSample {
            loads: vec![10.0, 50.0],
        }))
    }
}

#[derive(Debug)]
struct RamStub;

#[async_trait]
impl Collector for RamStub {
    fn category(&self) -> MetricCategory {
        MetricCategory::Ram
    }
    fn name(&self) -> &str {
        "ram-stub"
    }
    async fn collect(&self) -> AppResult<MetricValue> {
        Ok(MetricValue::Ram(RamSample {
            total_bytes: 2000,
            used_bytes: 500,
            ..Default::default()
        }))
    }
}

#[derive(Debug)]
struct BrokenGpu;

#[async_trait]
impl Collector for BrokenGpu {
    fn category(&self) -> MetricCategory {
        MetricCategory::Gpu
    }
    fn name(&self) -> &str {
        "broken-gpu"
    }
    async fn collect(&self) -> AppResult<MetricValue> {
        Err(AppError::collector("no device"))
    }
}

struct TestServer {
    addr: SocketAddr,
    engine: StreamEngine,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<AppResult<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let mut config = AppConfig::default();
        config.collection.interval_ms = 50;
        config.server.shutdown_grace_seconds = 1;
        config.window.capacity = 12;

        let engine = StreamEngine::new(
            config.collection.clone(),
            &config.stream,
            vec![
                Arc::new(CpuStub) as Arc<dyn Collector>,
                Arc::new(RamStub),
                Arc::new(BrokenGpu),
            ],
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = AppState::new(config, engine.clone());
        let task = tokio::spawn(serve(listener, state, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            engine,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    async fn wait_for_clients(&self, expected: usize) {
        for _ in 0..200 {
            if self.engine.hub.client_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {expected} clients, have {}",
            self.engine.hub.client_count()
        );
    }

    async fn stop(mut self) -> AppResult<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

async fn next(client: &mut ViewerClient) -> hostpulse_core::types::MetricSnapshot {
    tokio::time::timeout(Duration::from_secs(5), client.next_snapshot())
        .await
        .expect("no frame in time")
        .expect("receive")
        .expect("stream open")
}

#[tokio::test]
async fn test_viewer_receives_ordered_snapshots() {
    let server = TestServer::start().await;
    assert_eq!(server.engine.state(), EngineState::Stopped);

    let mut client = ViewerClient::connect(&server.ws_url()).await.unwrap();
    let mut store = MetricStore::new(3);
    let mut sequences = Vec::new();
    for _ in 0..5 {
        let snapshot = next(&mut client).await;
        assert_eq!(snapshot.cpu_loads, vec![10.0, 50.0]);
        assert_eq!(snapshot.cpu_total, 30.0);
        assert_eq!(snapshot.ram.used_percent, 25.0);
        assert_eq!(snapshot.missing, vec!["gpu".to_string()]);
        sequences.push(snapshot.sequence);
        store.ingest(&snapshot);
    }
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(server.engine.state(), EngineState::Running);

    let cpu = store.window(&StreamKey::CpuTotal).unwrap();
    assert_eq!(cpu.len(), 3);
    assert_eq!(cpu.latest(), 30.0);
    assert!(store.window(&StreamKey::GpuTotal).is_none());

    client.close().await.unwrap();
    server.wait_for_clients(0).await;
    assert_eq!(server.engine.state(), EngineState::Stopped);
    assert!(server.engine.stats().collector_failures >= 5);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_two_viewers_share_one_engine_run() {
    let server = TestServer::start().await;

    let mut first = ViewerClient::connect(&server.ws_url()).await.unwrap();
    let mut second = ViewerClient::connect(&server.ws_url()).await.unwrap();
    server.wait_for_clients(2).await;

    next(&mut first).await;
    next(&mut second).await;

    first.close().await.unwrap();
    server.wait_for_clients(1).await;
    assert_eq!(server.engine.state(), EngineState::Running);
    next(&mut second).await;

    second.close().await.unwrap();
    server.wait_for_clients(0).await;

    let stats = server.engine.stats();
    assert_eq!(stats.engine_starts, 1);
    assert_eq!(stats.engine_stops, 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_connected_viewers() {
    let server = TestServer::start().await;
    let mut client = ViewerClient::connect(&server.ws_url()).await.unwrap();
    next(&mut client).await;

    let engine = server.engine.clone();
    server.stop().await.unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.hub.client_count(), 0);

    // Frames already queued may still arrive before the close.
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next_snapshot().await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "viewer was not disconnected");
}

#[tokio::test]
async fn test_viewer_reads_window_capacity_from_server() {
    let server = TestServer::start().await;
    let capacity = fetch_window_capacity(&server.ws_url()).await.unwrap();
    assert_eq!(capacity, 12);
    server.stop().await.unwrap();
}
