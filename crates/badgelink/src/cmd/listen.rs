use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use badgelink_frame::{FrameConfig, FrameError, FrameReader, Message};
use badgelink_transport::StreamKind;
use tracing::{error, info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

/// Poll interval for socket bridges so Ctrl-C is noticed between reads.
const BRIDGE_READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Back-to-back stream faults tolerated before the device is considered gone.
const MAX_CONSECUTIVE_FAULTS: u32 = 16;

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let stream = args.link.open()?;

    let config = FrameConfig {
        read_timeout: match stream.kind() {
            StreamKind::Unix => Some(BRIDGE_READ_TIMEOUT),
            StreamKind::Device => None,
        },
        ..FrameConfig::default()
    };
    let mut reader = FrameReader::with_config_stream(stream, config)
        .map_err(|err| frame_error("configure failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    receive(&mut reader, &running, args.count, |message| {
        print_message(message, format)
    })?;

    let stats = reader.stats();
    if stats.checksum_mismatches > 0 {
        warn!(
            discarded = stats.checksum_mismatches,
            received = stats.messages,
            "frames dropped for bad checksum"
        );
    }

    Ok(SUCCESS)
}

/// Pull messages until EOF, `running` clears, or `count` is reached.
///
/// Stream faults have already reset the decoder inside the reader; they are
/// logged and reading carries on. Only a run of `MAX_CONSECUTIVE_FAULTS`
/// faults with no message in between ends the loop with an error.
fn receive<T, F>(
    reader: &mut FrameReader<T>,
    running: &AtomicBool,
    count: Option<usize>,
    mut on_message: F,
) -> CliResult<usize>
where
    T: Read,
    F: FnMut(&Message),
{
    let mut printed = 0usize;
    let mut faults = 0u32;

    while running.load(Ordering::SeqCst) {
        let message = match reader.read_message() {
            Ok(message) => message,
            Err(err) if err.is_timeout() => continue,
            Err(FrameError::ConnectionClosed) => {
                info!("badge link closed");
                break;
            }
            Err(err) => {
                faults += 1;
                if faults >= MAX_CONSECUTIVE_FAULTS {
                    return Err(frame_error("receive failed", err));
                }
                error!(error = %err, faults, "receive fault, still listening");
                continue;
            }
        };
        faults = 0;

        on_message(&message);
        printed = printed.saturating_add(1);

        if count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    Ok(printed)
}

/// First Ctrl-C stops after the current read; a second one exits at once,
/// since a blocking device read may never return.
fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};

    use badgelink_frame::encode;

    use super::*;

    /// Replays a fixed list of read results, then reports end of stream.
    struct ScriptedLink {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedLink {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedLink {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                None => Ok(0),
                Some(Err(err)) => Err(err),
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
            }
        }
    }

    fn collect(link: ScriptedLink, count: Option<usize>) -> CliResult<Vec<[u8; 4]>> {
        let mut reader = FrameReader::new(link);
        let running = AtomicBool::new(true);
        let mut seen = Vec::new();
        receive(&mut reader, &running, count, |m| seen.push(*m.as_bytes()))?;
        Ok(seen)
    }

    #[test]
    fn keeps_listening_after_stream_fault() {
        let first = encode(0x01, 0x2A);
        let second = encode(0x02, 0x07);
        let link = ScriptedLink::new(vec![
            Ok(first.to_vec()),
            Ok(second[..5].to_vec()),
            Err(io::Error::new(ErrorKind::BrokenPipe, "line glitch")),
            Ok(second.to_vec()),
        ]);

        let seen = collect(link, None).unwrap();

        assert_eq!(seen, vec![[0xBB, 0xFA, 0x01, 0x2A], [0xBB, 0xFA, 0x02, 0x07]]);
    }

    #[test]
    fn timeouts_keep_the_partial_frame() {
        let frame = encode(0x03, 0x33);
        let link = ScriptedLink::new(vec![
            Ok(frame[..7].to_vec()),
            Err(io::Error::new(ErrorKind::WouldBlock, "no data yet")),
            Ok(frame[7..].to_vec()),
        ]);

        assert_eq!(collect(link, None).unwrap(), vec![[0xBB, 0xFA, 0x03, 0x33]]);
    }

    #[test]
    fn gives_up_after_repeated_faults() {
        let script = (0..MAX_CONSECUTIVE_FAULTS)
            .map(|_| Err(io::Error::new(ErrorKind::BrokenPipe, "device gone")))
            .collect();

        let err = collect(ScriptedLink::new(script), None).unwrap_err();

        assert!(err.message.starts_with("receive failed"));
    }

    #[test]
    fn stops_at_count() {
        let wire: Vec<u8> = (0..4u8).flat_map(|i| encode(i, i)).collect();

        let seen = collect(ScriptedLink::new(vec![Ok(wire)]), Some(2)).unwrap();

        assert_eq!(seen.len(), 2);
    }
}
