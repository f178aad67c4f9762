use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays clean for `--format json`.
///
/// `RUST_LOG` applies when set; otherwise only warnings, or everything from
/// debug up with `--verbose`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
