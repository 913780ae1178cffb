use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use imapfilter::cli::Cli;
use imapfilter::session::Session;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let session = match Session::start(&cli.settings()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("imapfilter: {}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    let result = session.interact();
    session.stop();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("imapfilter: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
