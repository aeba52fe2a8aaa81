use reflecta_frame::{
    FrameCollector, FrameConfig, FrameDecoder, ProtocolViolation, DEFAULT_MAX_PAYLOAD,
};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_frame, print_violation, OutputFormat};

/// Decode a captured byte stream offline.
///
/// Exits with `DATA_INVALID` when any violation was seen, so the command can
/// be used to check a capture in scripts.
pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => return Err(CliError::new(USAGE, "one of --hex or --file is required")),
    };
    if args.capacity == 0 {
        return Err(CliError::new(USAGE, "--capacity must be greater than zero"));
    }

    let config = FrameConfig {
        buffer_capacity: args.capacity,
        max_payload_size: DEFAULT_MAX_PAYLOAD,
    };
    let mut decoder = FrameDecoder::with_config(&config);
    let mut frames = FrameCollector::new();
    let mut violations: Vec<ProtocolViolation> = Vec::new();

    // Print in arrival order: flush both collectors after every byte.
    for &byte in &wire {
        decoder
            .consume(byte, &mut frames, &mut violations)
            .map_err(|err| frame_error("decode failed", err))?;
        for violation in violations.drain(..) {
            print_violation(&violation, format);
        }
        for frame in frames.drain() {
            print_frame(&frame, format);
        }
    }

    let stats = decoder.stats();
    tracing::debug!(
        bytes = stats.bytes_consumed,
        frames = stats.frames_delivered,
        violations = stats.violations(),
        state = ?decoder.state(),
        "decode finished"
    );

    if stats.violations() > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}
