use std::{
    io::{self, BufRead, Write},
    thread,
};

use crossbeam::channel::{unbounded, Receiver};

use super::Context;
use crate::error::Error;

/// Operator input, one line at a time.
///
/// Lines are read on a helper thread so that waiting for input can be
/// combined with cancellation.
pub struct Lines {
    rx: Receiver<String>,
}

impl Lines {
    /// Starts reading standard input.
    pub fn stdin() -> Result<Self, Error> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("stdin".into())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            log::error!("failed to read stdin: {}", err);
                            break;
                        }
                    }
                }
            })?;
        Ok(Self { rx })
    }

    /// Serves a fixed script of lines, then reports end of input.
    pub fn scripted<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, rx) = unbounded();
        for line in lines {
            // The receiver is alive, so sending cannot fail.
            let _ = tx.send(line.into());
        }
        Self { rx }
    }

    /// Waits for the next line.
    ///
    /// Returns [`None`] on end of input or when `ctx` is cancelled.
    pub fn next(&self, ctx: &Context) -> Option<String> {
        ctx.wrap(&self.rx)
    }

    /// Prints `text` without a newline, then waits for the next line.
    pub fn prompt(&self, ctx: &Context, text: &str) -> Result<Option<String>, Error> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(self.next(ctx))
    }
}
