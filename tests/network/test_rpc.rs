use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use tiny_nameserver::network::frame::{read_frame, write_frame, MAX_FRAME_SIZE};
use tiny_nameserver::services::InMemoryCounterStore;
use tiny_nameserver::{
    ClientError, LoadBalancer, NameServer, NameServerClient, RpcError, RpcHandler, RpcServer,
    SelectionError, ServiceRegistry, Strategy, WorkerClient, WorkerPool, WorkerService,
};

const TIMEOUT: Duration = Duration::from_secs(2);

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl Running {
    async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
    }
}

async fn start(handler: Arc<dyn RpcHandler>) -> Running {
    let server = RpcServer::bind("127.0.0.1:0", handler).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(async {
        let _ = stopped.await;
    }));
    Running { addr, stop, handle }
}

async fn start_name_server() -> (Running, Arc<ServiceRegistry>) {
    let registry = Arc::new(ServiceRegistry::new());
    let running = start(Arc::new(NameServer::new(Arc::clone(&registry)))).await;
    (running, registry)
}

async fn start_worker() -> Running {
    start(Arc::new(WorkerService::new(Arc::new(InMemoryCounterStore::new())))).await
}

#[tokio::test]
async fn test_register_lookup_deregister_over_tcp() {
    let (running, registry) = start_name_server().await;
    let client = NameServerClient::new(running.addr.to_string(), TIMEOUT);

    let reply = client.register("10.0.0.1:9001", 0.5).await.unwrap();
    assert!(reply.success);
    client.register("10.0.0.1:9002", 0.5).await.unwrap();

    let servers = client.lookup("").await.unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(registry.len(), 2);

    let reply = client.deregister("10.0.0.1:9001").await.unwrap();
    assert!(reply.success);
    let servers = client.lookup("").await.unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].address, "10.0.0.1:9002");

    let reply = client.deregister("10.0.0.1:9001").await.unwrap();
    assert!(!reply.success);

    running.stop().await;
}

#[tokio::test]
async fn test_empty_address_is_a_reply_not_a_fault() {
    let (running, _registry) = start_name_server().await;
    let client = NameServerClient::new(running.addr.to_string(), TIMEOUT);

    let reply = client.register("", 0.5).await.unwrap();
    assert!(!reply.success);
    // the name server is still serving afterwards
    assert!(client.lookup("").await.unwrap().is_empty());

    running.stop().await;
}

#[tokio::test]
async fn test_several_calls_on_one_connection() {
    let (running, _registry) = start_name_server().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();

    use tiny_nameserver::messaging::protocol::{decode, encode, LookupArgs, Request, Response};
    for _ in 0..3 {
        let request = encode(&Request::Lookup(LookupArgs::default())).unwrap();
        write_frame(&mut stream, &request).await.unwrap();
        let payload = read_frame(&mut stream).await.unwrap().unwrap();
        assert!(matches!(
            decode::<Response>(&payload).unwrap(),
            Response::Lookup(_)
        ));
    }

    running.stop().await;
}

#[tokio::test]
async fn test_malformed_request_gets_fault() {
    let (running, _registry) = start_name_server().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();

    use tiny_nameserver::messaging::protocol::{decode, Response};
    write_frame(&mut stream, &[200, 1, 2]).await.unwrap();
    let payload = read_frame(&mut stream).await.unwrap().unwrap();
    assert!(matches!(decode::<Response>(&payload).unwrap(), Response::Fault(_)));

    running.stop().await;
}

#[tokio::test]
async fn test_oversized_frame_rejected() {
    let (mut client, mut server) = tokio::io::duplex(64);
    client
        .write_all(&((MAX_FRAME_SIZE as u32) + 1).to_le_bytes())
        .await
        .unwrap();
    assert!(matches!(
        read_frame(&mut server).await,
        Err(RpcError::FrameTooLarge(_))
    ));
}

#[tokio::test]
async fn test_clean_close_reads_none() {
    let (client, mut server) = tokio::io::duplex(64);
    drop(client);
    assert!(read_frame(&mut server).await.unwrap().is_none());
}

#[tokio::test]
async fn test_worker_calls_and_remote_faults() {
    let running = start_worker().await;
    let worker = WorkerClient::new(running.addr.to_string(), TIMEOUT);

    assert_eq!(worker.fibonacci(10).await.unwrap(), 55);
    assert_eq!(worker.counter("word").await.unwrap().count, 1);
    assert_eq!(worker.counter("word").await.unwrap().count, 2);

    assert!(matches!(worker.fibonacci(-1).await, Err(RpcError::Remote(_))));
    assert!(matches!(worker.counter("").await, Err(RpcError::Remote(_))));

    // registry methods are not served by workers
    let wrong = NameServerClient::new(running.addr.to_string(), TIMEOUT);
    assert!(matches!(wrong.lookup("").await, Err(RpcError::Remote(_))));

    running.stop().await;
}

#[tokio::test]
async fn test_call_timeout() {
    // accepts but never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let client = NameServerClient::new(addr.to_string(), Duration::from_millis(100));
    assert!(matches!(
        client.lookup("").await,
        Err(RpcError::Timeout { .. })
    ));
    silent.abort();
}

#[tokio::test]
async fn test_unreachable_name_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = NameServerClient::new(addr.to_string(), TIMEOUT);
    assert!(client.register("10.0.0.1:9001", 1.0).await.is_err());
}

#[tokio::test]
async fn test_worker_pool_round_robin_end_to_end() {
    let (directory, _registry) = start_name_server().await;
    let first = start_worker().await;
    let second = start_worker().await;

    let ns = NameServerClient::new(directory.addr.to_string(), TIMEOUT);
    ns.register(&first.addr.to_string(), 1.0).await.unwrap();
    ns.register(&second.addr.to_string(), 1.0).await.unwrap();

    let mut pool = WorkerPool::new(ns, LoadBalancer::new(Strategy::Stateless), TIMEOUT);
    assert_eq!(pool.refresh().await.unwrap(), 2);

    let mut hits: HashMap<String, usize> = HashMap::new();
    for i in 0..6 {
        let (address, reply) = pool.counter("shared").await.unwrap();
        // each worker has its own in-memory store
        assert_eq!(reply.count, i / 2 + 1);
        *hits.entry(address).or_default() += 1;
    }
    assert_eq!(hits.len(), 2);
    assert!(hits.values().all(|&n| n == 3));

    let (_, value) = pool.fibonacci(12).await.unwrap();
    assert_eq!(value, 144);

    first.stop().await;
    second.stop().await;
    directory.stop().await;
}

#[tokio::test]
async fn test_worker_pool_with_no_workers() {
    let (directory, _registry) = start_name_server().await;
    let ns = NameServerClient::new(directory.addr.to_string(), TIMEOUT);

    let mut pool = WorkerPool::new(ns, LoadBalancer::new(Strategy::Stateful), TIMEOUT);
    assert_eq!(pool.refresh().await.unwrap(), 0);
    assert_eq!(pool.pick().unwrap_err(), SelectionError::NoWorkers);
    assert!(matches!(
        pool.fibonacci(5).await,
        Err(ClientError::Selection(SelectionError::NoWorkers))
    ));

    directory.stop().await;
}
