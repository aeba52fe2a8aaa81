use bytes::BytesMut;
use reflecta_frame::{encode_frame, DEFAULT_MAX_PAYLOAD};

use crate::cmd::EncodeArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = args.payload.resolve()?;
    if payload.len() > DEFAULT_MAX_PAYLOAD {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "payload too large ({} bytes, max {DEFAULT_MAX_PAYLOAD})",
                payload.len()
            ),
        ));
    }

    let mut wire = BytesMut::new();
    let checksum = encode_frame(args.sequence, &payload, &mut wire);
    print_wire(args.sequence, checksum, &wire, format);
    Ok(SUCCESS)
}
