//! Print every message a badge sends, then poke it with one command.
//!
//! ```text
//! stty -F /dev/ttyUSB0 9600 cs8 -cstopb -parenb raw
//! cargo run --example monitor -- /dev/ttyUSB0
//! ```

use badgelink::frame::{Command, FrameReader, FrameWriter, Message};
use badgelink::transport::BadgeStream;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let stream = BadgeStream::open_device(&path)?;
    let mut writer = FrameWriter::new(stream.try_clone()?);
    let mut reader = FrameReader::new(stream);

    writer.send(&Command::new(0x01u8, 0x00))?;
    println!("listening on {path}");

    reader.run(&mut |message: Message| match message.as_command() {
        Some(command) => println!("mode={:#04x} data={:#04x}", command.mode, command.data),
        None => println!("status {message}"),
    })?;

    let stats = reader.stats();
    println!(
        "done: {} messages, {} bad checksums",
        stats.messages, stats.checksum_mismatches
    );
    Ok(())
}
