//! Best-effort reload of a running terminal after an install.
use super::Context;
use crate::config::ReloadHook;

/// Signal `hook.process` if it is running. Returns whether it was signalled.
///
/// Never fails: a missing `pgrep`/`pkill` or a failed signal is logged as a
/// warning. Skipped on Windows.
pub fn reload_terminal(ctx: &Context, hook: &ReloadHook) -> bool {
    if ctx.platform.is_windows() {
        return false;
    }

    let running = ctx
        .executor
        .run_unchecked("pgrep", &["-x", &hook.process])
        .is_ok_and(|r| r.success);
    if !running {
        return false;
    }

    let signal = format!("-{}", hook.signal);
    match ctx
        .executor
        .run_unchecked("pkill", &[&signal, "-x", &hook.process])
    {
        Ok(result) if result.success => {
            ctx.log.info(&format!("reloaded {}", hook.process));
            true
        }
        Ok(result) => {
            ctx.log.warn(&format!(
                "could not signal {}: {}",
                hook.process,
                result.stderr.trim()
            ));
            false
        }
        Err(e) => {
            ctx.log
                .warn(&format!("could not signal {}: {e:#}", hook.process));
            false
        }
    }
}
