use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use super::frame::{read_frame, write_frame};
use crate::error::RpcError;
use crate::messaging::protocol::{
    decode, encode, CounterArgs, CounterReply, DeregisterArgs, FibonacciArgs, LookupArgs,
    RegisterArgs, Request, Response, StatusReply,
};
use crate::services::WorkerInfo;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens one connection per call; the whole call (connect, send, receive)
/// is bounded by `timeout`.
#[derive(Clone, Debug)]
pub struct RpcClient {
    address: String,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        RpcClient {
            address: address.into(),
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn call(&self, request: &Request) -> Result<Response, RpcError> {
        match timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout {
                address: self.address.clone(),
                timeout: self.timeout,
            }),
        }
    }

    async fn exchange(&self, request: &Request) -> Result<Response, RpcError> {
        let mut stream = TcpStream::connect(&self.address).await?;
        write_frame(&mut stream, &encode(request)?).await?;
        let payload = read_frame(&mut stream).await?.ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before reply",
            )
        })?;

        match decode::<Response>(&payload)? {
            Response::Fault(message) => Err(RpcError::Remote(message)),
            response => Ok(response),
        }
    }
}

/// Typed calls against the name server.
#[derive(Clone, Debug)]
pub struct NameServerClient {
    rpc: RpcClient,
}

impl NameServerClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        NameServerClient {
            rpc: RpcClient::new(address, timeout),
        }
    }

    pub fn address(&self) -> &str {
        self.rpc.address()
    }

    pub async fn register(&self, address: &str, weight: f64) -> Result<StatusReply, RpcError> {
        let request = Request::Register(RegisterArgs {
            address: address.to_string(),
            weight,
        });
        match self.rpc.call(&request).await? {
            Response::Register(reply) => Ok(reply),
            _ => Err(RpcError::UnexpectedResponse("Register")),
        }
    }

    pub async fn deregister(&self, address: &str) -> Result<StatusReply, RpcError> {
        let request = Request::Deregister(DeregisterArgs {
            address: address.to_string(),
        });
        match self.rpc.call(&request).await? {
            Response::Deregister(reply) => Ok(reply),
            _ => Err(RpcError::UnexpectedResponse("Deregister")),
        }
    }

    pub async fn lookup(&self, service_name: &str) -> Result<Vec<WorkerInfo>, RpcError> {
        let request = Request::Lookup(LookupArgs {
            service_name: service_name.to_string(),
        });
        match self.rpc.call(&request).await? {
            Response::Lookup(reply) => Ok(reply.servers),
            _ => Err(RpcError::UnexpectedResponse("Lookup")),
        }
    }
}

/// Typed calls against one worker.
#[derive(Clone, Debug)]
pub struct WorkerClient {
    rpc: RpcClient,
}

impl WorkerClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        WorkerClient {
            rpc: RpcClient::new(address, timeout),
        }
    }

    pub async fn fibonacci(&self, n: i64) -> Result<i64, RpcError> {
        match self.rpc.call(&Request::Fibonacci(FibonacciArgs { n })).await? {
            Response::Fibonacci(reply) => Ok(reply.value),
            _ => Err(RpcError::UnexpectedResponse("Fibonacci")),
        }
    }

    pub async fn counter(&self, key: &str) -> Result<CounterReply, RpcError> {
        let request = Request::Counter(CounterArgs {
            key: key.to_string(),
        });
        match self.rpc.call(&request).await? {
            Response::Counter(reply) => Ok(reply),
            _ => Err(RpcError::UnexpectedResponse("Counter")),
        }
    }
}
