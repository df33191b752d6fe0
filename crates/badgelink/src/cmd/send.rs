use badgelink_frame::{FrameConfig, FrameWriter, WriteStrategy};
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let stream = args.link.open()?;
    let config = FrameConfig {
        write_strategy: write_strategy(args.split_writes),
        ..FrameConfig::default()
    };
    let mut writer = FrameWriter::with_config_stream(stream, config)
        .map_err(|err| frame_error("configure failed", err))?;

    let command = args.command.to_command();
    writer
        .send(&command)
        .map_err(|err| frame_error("send failed", err))?;
    info!(mode = command.mode, data = command.data, "command sent");

    Ok(SUCCESS)
}

fn write_strategy(split_writes: bool) -> WriteStrategy {
    if split_writes {
        WriteStrategy::PerField
    } else {
        WriteStrategy::Combined
    }
}
