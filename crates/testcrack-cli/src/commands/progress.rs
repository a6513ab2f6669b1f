use testcrack_core::FailureKind;

use super::{runtime, CmdResult, Context};

pub fn run(compact: bool) -> CmdResult {
    let mut ctx = Context::load()?;
    ctx.session.require_authenticated()?;
    let api = ctx.api()?;

    let progress = match runtime()?.block_on(api.user_progress()) {
        Ok(progress) => progress,
        Err(e) if e.kind() == FailureKind::Unauthorized => return Err(ctx.expire_session()),
        Err(e) => return Err(e.into()),
    };

    let json = if compact {
        serde_json::to_string(&progress)?
    } else {
        serde_json::to_string_pretty(&progress)?
    };
    println!("{json}");
    Ok(())
}
