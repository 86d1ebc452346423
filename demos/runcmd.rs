//! Enter a rootless user namespace, then run a command inside it.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example runcmd -- id -u
//! ```

use std::os::unix::process::CommandExt;
use std::process::{self, Command};

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Run a command inside a fresh rootless user namespace")]
struct Args {
    /// Program to execute after entering the namespace
    program: String,
    /// Arguments passed through to the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = rootless::UserNs::new().enter() {
        eprintln!("runcmd: {}", err);
        process::exit(1);
    }

    // Only reached if the exec itself failed.
    let err = Command::new(&args.program).args(&args.args).exec();
    eprintln!("runcmd: {}: {}", args.program, err);
    process::exit(1);
}
