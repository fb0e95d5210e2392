//! Binary entrypoint for the `revolve` refresh tool.

use std::process;

mod bootstrap;
mod cli;
mod output;

#[tokio::main]
async fn main() {
    let exit_code = cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
