//! `align`: check that every leaf of a markdown specification is covered by a
//! known test.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
