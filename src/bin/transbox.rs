use anyhow::Result;

fn main() -> Result<()> {
    transbox::cli::run()
}
