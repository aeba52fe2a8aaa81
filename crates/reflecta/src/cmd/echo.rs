use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reflecta_frame::{Diagnostic, Frame, FrameCollector, Link};
use reflecta_transport::Transport;

use crate::cmd::listen::install_ctrlc_handler;
use crate::cmd::EchoArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    let mut link = Link::new(args.device.open()?);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut frames = FrameCollector::new();
    while running.load(Ordering::SeqCst) {
        link.poll(&mut frames)
            .map_err(|err| frame_error("receive failed", err))?;
        echo_frames(&mut link, frames.drain())
            .map_err(|err| frame_error("echo send failed", err))?;
    }

    Ok(SUCCESS)
}

/// Send each frame's payload back. Diagnostics from the peer are logged
/// instead of echoed, so two echoing ends cannot bounce them forever.
fn echo_frames<T: Transport>(
    link: &mut Link<T>,
    frames: Vec<Frame>,
) -> reflecta_frame::Result<usize> {
    let mut echoed = 0;
    for frame in frames {
        if let Some(diagnostic) = Diagnostic::parse(frame.payload.as_ref()) {
            tracing::warn!(sequence = frame.sequence, %diagnostic, "peer reported");
            continue;
        }

        tracing::info!(
            sequence = frame.sequence,
            size = frame.payload.len(),
            "echoing frame"
        );
        link.send(frame.payload.as_ref())?;
        echoed += 1;
    }
    Ok(echoed)
}
