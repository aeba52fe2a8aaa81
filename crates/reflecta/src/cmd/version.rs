use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("reflecta {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: reflecta");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("REFLECTA_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "frame: max_payload={}, buffer_capacity={}",
        reflecta_frame::DEFAULT_MAX_PAYLOAD,
        reflecta_frame::DEFAULT_BUFFER_CAPACITY
    );
    println!(
        "serial: default_baud={}",
        reflecta_transport::DEFAULT_BAUD_RATE
    );

    Ok(SUCCESS)
}
