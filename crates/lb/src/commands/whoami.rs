//! `lb whoami` -- print the identity of the authenticated Remote user.

use anyhow::{Context, Result};

use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let client = ctx.require_client()?;
    let user = client.identify_current_user().context("failed to reach Remote")?;

    if ctx.json {
        crate::output::output_json(&user);
    } else {
        println!("{} <{}>", user.name, user.email);
    }
    Ok(())
}
