use std::process::ExitCode;

#[cfg(feature = "tracing")]
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    #[cfg(feature = "tracing")]
    {
        let subscriber = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }

    match huffpack::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
