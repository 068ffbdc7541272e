use std::env;
use std::process;

use yfactor::cli;

#[cfg(feature = "cli")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    // RUST_LOG=yfactor=debug shows every SCPI exchange and state transition
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    #[cfg(feature = "cli")]
    init_logging();

    let args: Vec<String> = env::args().collect();

    let _ = cli::Config::run(&args).unwrap_or_else(|err| {
        println!();
        if err.downcast_ref::<yfactor::Error>().is_some() {
            cli::print_failure(&err.to_string());
            process::exit(1);
        }
        cli::print_error(&err.to_string()); //print at the top, but might be lost or hard to read
        println!();
        cli::print_help();
        println!();
        cli::print_error(&err.to_string()); // print error again, for human factors
        process::exit(1);
    });
}
