use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.to_command();
    print_frame(&command, &command.to_frame(), format);
    Ok(SUCCESS)
}
