//! `intake` - fill in and submit talent intake forms from the terminal.

mod app;
mod cli;
mod config;
mod effects;
mod notifier;
mod render;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    app::run(cli::Cli::parse())
}
