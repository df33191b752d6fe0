//! Async variant of `monitor` over a Unix socket bridge.
//!
//! ```text
//! socat UNIX-LISTEN:/tmp/badge.sock,fork /dev/ttyUSB0,b9600,raw
//! cargo run --example async-monitor --features async -- /tmp/badge.sock
//! ```

use badgelink::frame::{BadgeCodec, Command};
use futures_util::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/badge.sock".to_string());

    let stream = UnixStream::connect(&path).await?;
    let mut framed = Framed::new(stream, BadgeCodec::new());

    framed.send(Command::new(0x01u8, 0x00)).await?;

    while let Some(message) = framed.next().await {
        let message = message?;
        println!("{message}");
    }

    Ok(())
}
