use pomo_core::get_interval;

use super::Context;

/// Print the interval the selector would hand out now. Nothing is stored.
pub fn next(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.settings.interval_config(ctx.repo()?);
    let interval = get_interval(&config)?;
    println!("{}", serde_json::to_string_pretty(&interval)?);
    Ok(())
}

pub fn show(ctx: &Context, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let interval = ctx.repo()?.by_id(id)?;
    println!("{}", serde_json::to_string_pretty(&interval)?);
    Ok(())
}

pub fn last(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let interval = ctx.repo()?.last()?;
    println!("{}", serde_json::to_string_pretty(&interval)?);
    Ok(())
}

pub fn breaks(ctx: &Context, n: usize) -> Result<(), Box<dyn std::error::Error>> {
    let breaks = ctx.repo()?.breaks(n)?;
    println!("{}", serde_json::to_string_pretty(&breaks)?);
    Ok(())
}
