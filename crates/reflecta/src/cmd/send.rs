use std::time::{Duration, Instant};

use reflecta_frame::{Frame, FrameCollector, Link};
use reflecta_transport::Transport;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let payload = args.payload.resolve()?;

    let mut link = Link::new(args.device.open()?);
    let sequence = link
        .send(&payload)
        .map_err(|err| frame_error("send failed", err))?;
    tracing::info!(sequence, size = payload.len(), "sent frame");

    if args.wait {
        match wait_for_response(&mut link, wait_timeout)
            .map_err(|err| frame_error("receive failed", err))?
        {
            Some(frame) => print_frame(&frame, format),
            None => {
                return Err(CliError::new(
                    TIMEOUT,
                    format!("no response within {}", args.wait_timeout),
                ))
            }
        }
    }

    Ok(SUCCESS)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Poll until the first frame arrives or `timeout` elapses.
///
/// Each poll blocks for at most the transport's read timeout, so the
/// deadline is only checked between polls.
fn wait_for_response<T: Transport>(
    link: &mut Link<T>,
    timeout: Duration,
) -> reflecta_frame::Result<Option<Frame>> {
    let deadline = Instant::now() + timeout;
    let mut frames = FrameCollector::new();
    loop {
        link.poll(&mut frames)?;
        if let Some(frame) = frames.drain().into_iter().next() {
            return Ok(Some(frame));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflecta_transport::MemoryTransport;

    #[test]
    fn wait_for_response_returns_first_frame() {
        let mut peer = Link::new(MemoryTransport::new());
        peer.send(b"first").unwrap();
        peer.send(b"second").unwrap();
        let wire = peer.get_mut().take_outgoing();

        let mut link = Link::new(MemoryTransport::with_incoming(&wire));
        let frame = wait_for_response(&mut link, Duration::from_millis(50))
            .unwrap()
            .expect("a frame should arrive");
        assert_eq!(frame.sequence, 0);
        assert_eq!(frame.payload.as_ref(), b"first");
    }

    #[test]
    fn wait_for_response_times_out() {
        let mut link = Link::new(MemoryTransport::new());
        let frame = wait_for_response(&mut link, Duration::from_millis(20)).unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
    }
}
