// readmegen/src/main.rs

use anyhow::Result;
use readmegen::commands;

fn main() -> Result<()> {
    commands::run_cli()
}
