//! Running bundler command lines through the platform shell.

use crate::error::{HabitableError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How a shell invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellExit {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub duration: Duration,
    /// Lines read from stdout and stderr respectively.
    pub line_counts: (usize, usize),
}

impl ShellExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Where and with what environment a command line runs.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    pub cwd: Option<PathBuf>,

    /// Added to the inherited environment.
    pub env: HashMap<String, String>,
}

/// A line of output, tagged with the stream it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Receives output lines as they arrive.
pub type OutputCallback = Box<dyn Fn(OutputLine) + Send>;

/// Run `command` through the platform shell, streaming both output streams.
///
/// stdout and stderr are drained by two independent reader threads. Lines
/// reach `callback` in arrival order. The call returns only after both
/// streams are exhausted and the process has exited. There is no timeout.
pub fn execute_streaming(
    command: &str,
    options: &CommandOptions,
    callback: OutputCallback,
) -> Result<ShellExit> {
    let started = Instant::now();
    tracing::trace!("running '{}' in {:?}", command, options.cwd);

    let (shell, flag) = platform_shell();
    let mut cmd = Command::new(shell);
    cmd.arg(flag)
        .arg(command)
        .envs(&options.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    let spawn_failed = |e: std::io::Error| {
        tracing::error!("could not start '{}': {}", command, e);
        HabitableError::BundlerFailed {
            command: command.to_string(),
            code: None,
        }
    };

    let mut child = cmd.spawn().map_err(spawn_failed)?;

    let (tx, rx) = mpsc::channel();
    let readers = (
        child.stdout.take().map(|s| drain(s, OutputLine::Stdout, tx.clone())),
        child.stderr.take().map(|s| drain(s, OutputLine::Stderr, tx)),
    );

    // Ends once both readers drop their senders.
    for line in rx {
        callback(line);
    }

    let line_counts = (join_reader(readers.0), join_reader(readers.1));
    let status = child.wait().map_err(spawn_failed)?;

    let exit = ShellExit {
        code: status.code(),
        duration: started.elapsed(),
        line_counts,
    };
    tracing::trace!("'{}' finished with {:?}", command, exit);
    Ok(exit)
}

/// Forward every line of `stream` to `tx`, returning how many were read.
fn drain<R>(stream: R, tag: fn(String) -> OutputLine, tx: Sender<OutputLine>) -> JoinHandle<usize>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut count = 0;
        for line in BufReader::new(stream).lines().map_while(std::io::Result::ok) {
            count += 1;
            if tx.send(tag(line)).is_err() {
                break;
            }
        }
        count
    })
}

fn join_reader(reader: Option<JoinHandle<usize>>) -> usize {
    reader.and_then(|r| r.join().ok()).unwrap_or(0)
}

fn platform_shell() -> (String, &'static str) {
    if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    }
}
