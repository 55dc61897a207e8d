//! Host environment interface.
//!
//! The engine reaches the outside world only through the [`Host`] trait:
//! line-by-line input, whole-file reads and writes with byte counts,
//! shell execution, an output stream, and the two asynchronous interrupt
//! flags (user interrupt, hangup). [`SystemHost`] wires these to stdin,
//! stdout, the filesystem, and `$SHELL`; [`ScriptedHost`] replays a
//! canned script for headless runs and tests.

use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether a file write replaces or extends the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// The narrow interface between the engine and its environment.
pub trait Host {
    /// Read one input line, rendering `prompt` first when given.
    /// `Ok(None)` signals end of input.
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>>;

    /// Emit one line on the normal output stream.
    fn write_line(&mut self, text: &str) -> io::Result<()>;

    /// Read a file as an ordered sequence of lines plus its byte count.
    fn read_file(&mut self, path: &Path) -> io::Result<(Vec<String>, u64)>;

    /// Persist `lines` to `path`, returning the byte count written.
    fn write_file(&mut self, path: &Path, lines: &[String], mode: WriteMode) -> io::Result<u64>;

    /// Run a shell command, returning its captured stdout lines.
    fn run_shell(&mut self, command: &str) -> io::Result<Vec<String>>;

    /// Consume the pending user-interrupt flag, if set.
    fn take_interrupt(&mut self) -> bool;

    /// True when a hangup/terminate request is pending.
    fn hangup_pending(&self) -> bool;
}

static INTERRUPT: AtomicBool = AtomicBool::new(false);
static HANGUP: AtomicBool = AtomicBool::new(false);

/// Register the SIGINT/SIGHUP handlers feeding the interrupt flags.
/// No-op on platforms without POSIX signals.
pub fn install_signal_handlers() {
    #[cfg(unix)]
    unsafe {
        let int_handler = handle_sigint as extern "C" fn(libc::c_int);
        let hup_handler = handle_sighup as extern "C" fn(libc::c_int);
        libc::signal(libc::SIGINT, int_handler as libc::sighandler_t);
        libc::signal(libc::SIGHUP, hup_handler as libc::sighandler_t);
    }
}

#[cfg(unix)]
extern "C" fn handle_sigint(_: libc::c_int) {
    INTERRUPT.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
extern "C" fn handle_sighup(_: libc::c_int) {
    HANGUP.store(true, Ordering::SeqCst);
}

/// Host implementation over the real terminal, filesystem, and shell.
#[derive(Debug, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }

    fn shell() -> PathBuf {
        if let Ok(shell) = std::env::var("SHELL") {
            if !shell.is_empty() {
                return PathBuf::from(shell);
            }
        }
        which::which("sh").unwrap_or_else(|_| PathBuf::from("/bin/sh"))
    }
}

impl Host for SystemHost {
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<Option<String>> {
        if let Some(p) = prompt {
            print!("{p}");
            io::stdout().flush()?;
        }
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")
    }

    fn read_file(&mut self, path: &Path) -> io::Result<(Vec<String>, u64)> {
        let content = std::fs::read_to_string(path)?;
        let bytes = content.len() as u64;
        let lines = content.lines().map(String::from).collect();
        tracing::debug!(path = %path.display(), bytes, "read file");
        Ok((lines, bytes))
    }

    fn write_file(&mut self, path: &Path, lines: &[String], mode: WriteMode) -> io::Result<u64> {
        let mut bytes = 0u64;
        match mode {
            WriteMode::Truncate => {
                // Write to a sibling temp file, then persist atomically.
                let dir = match path.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p,
                    _ => Path::new("."),
                };
                let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
                for line in lines {
                    tmp.write_all(line.as_bytes())?;
                    tmp.write_all(b"\n")?;
                    bytes += line.len() as u64 + 1;
                }
                tmp.flush()?;
                tmp.persist(path).map_err(|e| e.error)?;
            }
            WriteMode::Append => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                for line in lines {
                    file.write_all(line.as_bytes())?;
                    file.write_all(b"\n")?;
                    bytes += line.len() as u64 + 1;
                }
                file.flush()?;
            }
        }
        tracing::debug!(path = %path.display(), bytes, ?mode, "wrote file");
        Ok(bytes)
    }

    fn run_shell(&mut self, command: &str) -> io::Result<Vec<String>> {
        let output = Command::new(Self::shell()).arg("-c").arg(command).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(String::from).collect())
    }

    fn take_interrupt(&mut self) -> bool {
        INTERRUPT.swap(false, Ordering::SeqCst)
    }

    fn hangup_pending(&self) -> bool {
        HANGUP.load(Ordering::SeqCst)
    }
}

/// Host implementation replaying a canned input script against an
/// in-memory filesystem. Used for headless execution and in tests.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    pub input: VecDeque<String>,
    pub output: Vec<String>,
    pub files: HashMap<PathBuf, Vec<String>>,
    pub shell_commands: Vec<String>,
    pub shell_output: Vec<String>,
    pub interrupt: bool,
    pub hangup: bool,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose input queue holds the given lines.
    pub fn with_input(lines: &[&str]) -> Self {
        Self {
            input: lines.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl Host for ScriptedHost {
    fn read_line(&mut self, _prompt: Option<&str>) -> io::Result<Option<String>> {
        Ok(self.input.pop_front())
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.output.push(text.to_string());
        Ok(())
    }

    fn read_file(&mut self, path: &Path) -> io::Result<(Vec<String>, u64)> {
        let lines = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        let bytes = lines.iter().map(|l| l.len() as u64 + 1).sum();
        Ok((lines, bytes))
    }

    fn write_file(&mut self, path: &Path, lines: &[String], mode: WriteMode) -> io::Result<u64> {
        let bytes = lines.iter().map(|l| l.len() as u64 + 1).sum();
        match mode {
            WriteMode::Truncate => {
                self.files.insert(path.to_path_buf(), lines.to_vec());
            }
            WriteMode::Append => {
                self.files
                    .entry(path.to_path_buf())
                    .or_default()
                    .extend(lines.iter().cloned());
            }
        }
        Ok(bytes)
    }

    fn run_shell(&mut self, command: &str) -> io::Result<Vec<String>> {
        self.shell_commands.push(command.to_string());
        Ok(self.shell_output.clone())
    }

    fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.interrupt)
    }

    fn hangup_pending(&self) -> bool {
        self.hangup
    }
}
