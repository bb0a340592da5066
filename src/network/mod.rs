pub mod frame;
pub mod rpc_client;
pub mod tcp_server;

pub use rpc_client::{NameServerClient, RpcClient, WorkerClient, DEFAULT_CALL_TIMEOUT};
pub use tcp_server::RpcServer;

use crate::messaging::{Request, Response};

/// Server-side dispatch. Handlers are synchronous and run on the blocking
/// pool; failures must come back as a `Response`, never as a panic.
pub trait RpcHandler: Send + Sync + 'static {
    fn handle(&self, request: Request) -> Response;
}
