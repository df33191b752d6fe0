use std::io::Read;

use badgelink_frame::{parse_hex, FrameDecoder, Message};
use tracing::{info, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = if args.hex.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|err| io_error("failed reading stdin", err))?;
        buf
    } else {
        args.hex.join(" ")
    };

    let bytes = parse_hex(&input).map_err(|err| frame_error("decode failed", err))?;
    let mut decoder = FrameDecoder::new();
    let delivered = decoder.feed_chunk(&bytes, &mut |message: Message| {
        print_message(&message, format)
    });

    let stats = decoder.stats();
    if !decoder.is_idle() {
        warn!(progress = decoder.progress(), "trailing partial frame");
    }
    info!(
        bytes = bytes.len(),
        messages = delivered,
        checksum_mismatches = stats.checksum_mismatches,
        "decode finished"
    );

    if delivered == 0 {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}
