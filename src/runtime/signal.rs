use std::{mem::MaybeUninit, ptr, thread};

use super::Context;
use crate::error::{Error, SentinelError};

/// Cancels `ctx` when the process receives SIGINT or SIGTERM.
///
/// The signals are blocked on the calling thread and waited for on a
/// dedicated thread, so no code runs in signal-handler context. Call this
/// before spawning other threads: they inherit the signal mask.
pub fn cancel_on_interrupt(ctx: &Context) -> Result<(), Error> {
    let set = unsafe {
        let mut set = MaybeUninit::<libc::sigset_t>::uninit();
        libc::sigemptyset(set.as_mut_ptr()).check()?;
        let mut set = set.assume_init();
        libc::sigaddset(&mut set, libc::SIGINT).check()?;
        libc::sigaddset(&mut set, libc::SIGTERM).check()?;
        libc::pthread_sigmask(libc::SIG_BLOCK, &set, ptr::null_mut()).check()?;
        set
    };

    let ctx = ctx.clone();
    thread::Builder::new()
        .name("signals".into())
        .spawn(move || loop {
            let mut sig: libc::c_int = 0;
            let rc = unsafe { libc::sigwait(&set, &mut sig) };
            if rc != 0 {
                log::error!("sigwait failed: {}", Error::System(rc));
                return;
            }
            if ctx.is_done() {
                log::warn!("signal {} received again; still shutting down", sig);
            } else {
                log::warn!("signal {} received; stopping", sig);
                ctx.cancel();
            }
        })?;
    Ok(())
}
