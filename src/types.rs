use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Filesystem operation carried by an [`Event`](crate::watch::Event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Chmod,
    Create,
    Remove,
    Rename,
    Write,
}

impl Operation {
    /// All operations, sorted by name (used for CLI choices and messages).
    pub const ALL: [Operation; 5] = [
        Operation::Chmod,
        Operation::Create,
        Operation::Remove,
        Operation::Rename,
        Operation::Write,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Chmod => "chmod",
            Operation::Create => "create",
            Operation::Remove => "remove",
            Operation::Rename => "rename",
            Operation::Write => "write",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chmod" => Ok(Operation::Chmod),
            "create" => Ok(Operation::Create),
            "remove" => Ok(Operation::Remove),
            "rename" => Ok(Operation::Rename),
            "write" => Ok(Operation::Write),
            other => Err(format!(
                "invalid operation: {other} (expected one of chmod, create, remove, rename, write)"
            )),
        }
    }
}

/// POSIX signal that can be forwarded to a running action process.
///
/// Parsed from names like `"SIGTERM"` (the `SIG` prefix and case are
/// optional on input; output always uses the canonical upper-case name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    Abrt,
    Alrm,
    Bus,
    Chld,
    Cont,
    Fpe,
    Hup,
    Ill,
    Int,
    Io,
    Kill,
    Pipe,
    Prof,
    Quit,
    Segv,
    Stop,
    Sys,
    Term,
    Trap,
    Tstp,
    Ttin,
    Ttou,
    Urg,
    Usr1,
    Usr2,
    Vtalrm,
    Winch,
    Xcpu,
    Xfsz,
}

/// Signal used when neither the action nor the global configuration names one.
pub const DEFAULT_SIGNAL: Signal = Signal::Kill;

impl Default for Signal {
    fn default() -> Self {
        DEFAULT_SIGNAL
    }
}

impl Signal {
    pub const ALL: [Signal; 29] = [
        Signal::Abrt,
        Signal::Alrm,
        Signal::Bus,
        Signal::Chld,
        Signal::Cont,
        Signal::Fpe,
        Signal::Hup,
        Signal::Ill,
        Signal::Int,
        Signal::Io,
        Signal::Kill,
        Signal::Pipe,
        Signal::Prof,
        Signal::Quit,
        Signal::Segv,
        Signal::Stop,
        Signal::Sys,
        Signal::Term,
        Signal::Trap,
        Signal::Tstp,
        Signal::Ttin,
        Signal::Ttou,
        Signal::Urg,
        Signal::Usr1,
        Signal::Usr2,
        Signal::Vtalrm,
        Signal::Winch,
        Signal::Xcpu,
        Signal::Xfsz,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Signal::Abrt => "SIGABRT",
            Signal::Alrm => "SIGALRM",
            Signal::Bus => "SIGBUS",
            Signal::Chld => "SIGCHLD",
            Signal::Cont => "SIGCONT",
            Signal::Fpe => "SIGFPE",
            Signal::Hup => "SIGHUP",
            Signal::Ill => "SIGILL",
            Signal::Int => "SIGINT",
            Signal::Io => "SIGIO",
            Signal::Kill => "SIGKILL",
            Signal::Pipe => "SIGPIPE",
            Signal::Prof => "SIGPROF",
            Signal::Quit => "SIGQUIT",
            Signal::Segv => "SIGSEGV",
            Signal::Stop => "SIGSTOP",
            Signal::Sys => "SIGSYS",
            Signal::Term => "SIGTERM",
            Signal::Trap => "SIGTRAP",
            Signal::Tstp => "SIGTSTP",
            Signal::Ttin => "SIGTTIN",
            Signal::Ttou => "SIGTTOU",
            Signal::Urg => "SIGURG",
            Signal::Usr1 => "SIGUSR1",
            Signal::Usr2 => "SIGUSR2",
            Signal::Vtalrm => "SIGVTALRM",
            Signal::Winch => "SIGWINCH",
            Signal::Xcpu => "SIGXCPU",
            Signal::Xfsz => "SIGXFSZ",
        }
    }

    #[cfg(unix)]
    pub fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal as Nix;
        match self {
            Signal::Abrt => Nix::SIGABRT,
            Signal::Alrm => Nix::SIGALRM,
            Signal::Bus => Nix::SIGBUS,
            Signal::Chld => Nix::SIGCHLD,
            Signal::Cont => Nix::SIGCONT,
            Signal::Fpe => Nix::SIGFPE,
            Signal::Hup => Nix::SIGHUP,
            Signal::Ill => Nix::SIGILL,
            Signal::Int => Nix::SIGINT,
            Signal::Io => Nix::SIGIO,
            Signal::Kill => Nix::SIGKILL,
            Signal::Pipe => Nix::SIGPIPE,
            Signal::Prof => Nix::SIGPROF,
            Signal::Quit => Nix::SIGQUIT,
            Signal::Segv => Nix::SIGSEGV,
            Signal::Stop => Nix::SIGSTOP,
            Signal::Sys => Nix::SIGSYS,
            Signal::Term => Nix::SIGTERM,
            Signal::Trap => Nix::SIGTRAP,
            Signal::Tstp => Nix::SIGTSTP,
            Signal::Ttin => Nix::SIGTTIN,
            Signal::Ttou => Nix::SIGTTOU,
            Signal::Urg => Nix::SIGURG,
            Signal::Usr1 => Nix::SIGUSR1,
            Signal::Usr2 => Nix::SIGUSR2,
            Signal::Vtalrm => Nix::SIGVTALRM,
            Signal::Winch => Nix::SIGWINCH,
            Signal::Xcpu => Nix::SIGXCPU,
            Signal::Xfsz => Nix::SIGXFSZ,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let wanted = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{upper}")
        };
        Signal::ALL
            .into_iter()
            .find(|sig| sig.name() == wanted)
            .ok_or_else(|| format!("unknown signal: {s}"))
    }
}

impl TryFrom<String> for Signal {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signal> for String {
    fn from(value: Signal) -> Self {
        value.name().to_string()
    }
}

/// Backend kind of an action, as named on the CLI (`--action`) and in records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ActionKind {
    #[default]
    #[value(name = "exec")]
    Exec,
    #[value(name = "shell")]
    Shell,
    #[value(name = "dockerRun")]
    DockerRun,
    #[value(name = "httpGet")]
    HttpGet,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Exec => "exec",
            ActionKind::Shell => "shell",
            ActionKind::DockerRun => "dockerRun",
            ActionKind::HttpGet => "httpGet",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
