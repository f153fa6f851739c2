//! Simple WebSocket echo server example.
//!
//! Run with: cargo run --example echo_server
//! Then connect with any WebSocket client, e.g. `websocat ws://127.0.0.1:9001`.
//! Set `RUST_LOG=wirews=trace` to see frame-level logs.

use std::error::Error;

use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;
use wirews::{CloseCode, CloseFrame, Config, OpCode, accept};

const ADDR: &str = "127.0.0.1:9001";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("WebSocket Echo Server listening on {}", ADDR);

    let listener = TcpListener::bind(ADDR).await?;

    loop {
        let (stream, addr) = listener.accept().await?;
        println!("New connection from: {}", addr);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream).await {
                eprintln!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream) -> wirews::Result<()> {
    // Step 1: Read the upgrade request and answer it
    let (mut session, request) = accept(stream, Config::default()).await?;
    println!("  Handshake complete for path: {}", request.path);

    // Step 2: Echo loop
    while session.is_open() {
        let frame = match session.receive_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                println!("  Receive failed: {}", e);
                let code = match e {
                    wirews::Error::MessageTooLarge { .. } => CloseCode::MessageTooBig,
                    _ => CloseCode::ProtocolError,
                };
                session.close("", code.as_u16()).await?;
                break;
            }
        };

        match frame.kind() {
            Ok(OpCode::Text) => {
                let text = String::from_utf8_lossy(frame.payload());
                println!("  Received text: {}", text);
                session.send(&text).await?;
            }
            Ok(OpCode::Binary) => {
                println!("  Received binary: {} bytes", frame.payload().len());
                session.send_bytes(frame.payload()).await?;
            }
            Ok(OpCode::Ping) => {
                println!("  Received ping ({} bytes)", frame.payload().len());
                session.pong(frame.payload()).await?;
            }
            Ok(OpCode::Close) => {
                let close = CloseFrame::parse(frame.payload());
                match &close {
                    Some(cf) => println!("  Received close: {} - {}", cf.code.as_u16(), cf.reason),
                    None => println!("  Received close (no code)"),
                }
                let code = close.map_or(1000, |cf| cf.code.as_u16());
                session.close("", code).await?;
            }
            _ => {
                // Pongs and continuation frames need no reply
            }
        }
    }

    println!("  Session ended");
    Ok(())
}
