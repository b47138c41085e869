fn main() -> anyhow::Result<()> {
    portfolio_pulse_lib::run()?;
    Ok(())
}
