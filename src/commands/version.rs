//! Command: print version information.

/// Version stamped at build time, or the crate version.
pub const VERSION: &str = match option_env!("CONFIG_ROCKET_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Print the config-rocket version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("config-rocket {VERSION}");
}
