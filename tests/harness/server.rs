//! Echo server on an ephemeral port.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use wirews::{CloseCode, Config, Error};

/// Echoes every received payload back as a BINARY frame and answers CLOSE
/// with the peer's status code.
pub struct TestServer {
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> (Self, SocketAddr) {
        Self::spawn_with_config(Config::default()).await
    }

    pub async fn spawn_with_config(config: Config) -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                tokio::spawn(async move {
                    if let Err(e) = echo(stream, config).await {
                        tracing::debug!(%peer, error = %e, "echo connection ended");
                    }
                });
            }
        });

        (Self { handle }, addr)
    }

    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

async fn echo(stream: TcpStream, config: Config) -> wirews::Result<()> {
    let (mut session, _request) = wirews::accept(stream, config).await?;
    loop {
        match session.receive().await {
            Ok(payload) => session.send_bytes(&payload).await?,
            Err(Error::PeerClosed(frame)) => {
                let code = frame.map_or(1000, |f| f.code.as_u16());
                return session.close("", code).await;
            }
            Err(e) => {
                let code = match e {
                    Error::MessageTooLarge { .. } => CloseCode::MessageTooBig,
                    _ => CloseCode::ProtocolError,
                };
                let _ = session.close("", code.as_u16()).await;
                return Err(e);
            }
        }
    }
}
