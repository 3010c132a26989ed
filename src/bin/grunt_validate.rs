//! Standalone CLI: runs the table-image validator over a file and prints
//! the emitted events, exiting with the host-style success/invalid code
//! the real table services layer would see from the integration shim.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use grunt_vm::shim::{to_table_services_status, TableServicesStatus};
use grunt_vm::validator;

#[derive(Parser, Debug)]
#[command(name = "grunt-validate", about = "Validate a four-entry table image with the Grunt VM", version)]
struct Cli {
    /// Path to the table image (48 bytes: four 12-byte records).
    image: PathBuf,

    /// Minimum severity to print (1 = information, 2 = error).
    #[arg(long, default_value_t = 1)]
    min_severity: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let image = match fs::read(&cli.image) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::error!("failed to read {}: {err}", cli.image.display());
            return ExitCode::FAILURE;
        }
    };

    if image.len() != validator::IMAGE_LEN {
        log::error!(
            "{} is {} bytes, expected exactly {} ({} entries x {} bytes)",
            cli.image.display(),
            image.len(),
            validator::IMAGE_LEN,
            validator::NUM_ENTRIES,
            validator::RECORD_LEN,
        );
        return ExitCode::FAILURE;
    }

    let program = validator::build_program();
    let min_severity = cli.min_severity;
    let mut sink = move |event_id: u32, severity: u32, line: &[u8]| {
        if severity >= min_severity {
            println!("[{severity}] {:#06x}: {}", event_id, String::from_utf8_lossy(line).trim_end_matches('\0'));
        }
    };

    let status = grunt_vm::run(&program, &image, &validator::STRINGS, &mut sink);
    log::debug!("validator run finished with status {status:?}");

    match to_table_services_status(status) {
        TableServicesStatus::Success => ExitCode::SUCCESS,
        TableServicesStatus::Invalid => ExitCode::FAILURE,
    }
}
