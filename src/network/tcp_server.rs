use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use super::frame::{read_frame, write_frame};
use super::RpcHandler;
use crate::error::RpcError;
use crate::messaging::protocol::{decode, encode, Request, Response};
use crate::utils::Logger;

/// Accepts connections and answers framed requests with `handler`, one task
/// per connection. A connection may carry any number of calls.
pub struct RpcServer {
    listener: TcpListener,
    handler: Arc<dyn RpcHandler>,
    logger: Arc<Logger>,
}

impl RpcServer {
    pub async fn bind(addr: &str, handler: Arc<dyn RpcHandler>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, handler))
    }

    pub fn from_listener(listener: TcpListener, handler: Arc<dyn RpcHandler>) -> Self {
        RpcServer {
            listener,
            handler,
            logger: Logger::instance(),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` resolves, then drops the listener. Whatever
    /// `shutdown` does runs before the listener is closed.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.logger.info("RPC server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            self.logger.warning(&format!("accept failed: {}", e));
                            continue;
                        }
                    };

                    let handler = Arc::clone(&self.handler);
                    let logger = Arc::clone(&self.logger);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, handler).await {
                            logger.warning(&format!("connection {} closed with error: {}", peer, e));
                        }
                    });
                }
            }
        }
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    handler: Arc<dyn RpcHandler>,
) -> Result<(), RpcError> {
    while let Some(payload) = read_frame(&mut socket).await? {
        let response = match decode::<Request>(&payload) {
            Ok(request) => {
                let handler = Arc::clone(&handler);
                tokio::task::spawn_blocking(move || handler.handle(request))
                    .await
                    .unwrap_or_else(|e| Response::Fault(format!("handler panicked: {}", e)))
            }
            Err(e) => Response::Fault(format!("malformed request: {}", e)),
        };
        write_frame(&mut socket, &encode(&response)?).await?;
    }
    Ok(())
}
