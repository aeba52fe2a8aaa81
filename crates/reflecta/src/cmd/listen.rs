use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reflecta_frame::{FrameCollector, Link};

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut link = Link::new(args.device.open()?);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut frames = FrameCollector::new();
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        link.poll(&mut frames)
            .map_err(|err| frame_error("receive failed", err))?;

        for frame in frames.drain() {
            print_frame(&frame, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    let stats = link.decoder().stats();
    tracing::info!(
        frames = stats.frames_delivered,
        violations = stats.violations(),
        "listener stopped"
    );
    Ok(SUCCESS)
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
