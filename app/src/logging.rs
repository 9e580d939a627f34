use env_logger::{Env, Target};

/// Initialises logging for the process.
///
/// Logs go to stderr so stdout stays machine-readable. Level is Debug in
/// development builds (or with `--verbose`) and Info in production builds;
/// `RUST_LOG` overrides both.
pub fn init(verbose: bool) {
    let default_level = if verbose || cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .filter_module("hyper_util", log::LevelFilter::Info)
        .filter_module("reqwest", log::LevelFilter::Info)
        .target(Target::Stderr)
        .init();
}
