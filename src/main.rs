fn main() -> anyhow::Result<()> {
    taskgame::run()?;
    Ok(())
}
