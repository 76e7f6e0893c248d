//! chatdown: export a saved Google AI Mode conversation to Markdown.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
