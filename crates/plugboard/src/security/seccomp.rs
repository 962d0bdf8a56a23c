//! Seccomp whitelist rendering.
//!
//! A whitelist lists one syscall per line, optionally followed by argument
//! filters. Comments start with `#`. The loader compiles it to BPF and
//! denies everything not listed.

use bytes::Bytes;
use plugboard_common::SecurityTag;

/// Syscalls every confined process needs to start and run.
const BASE_SYSCALLS: &[&str] = &[
    "access",
    "arch_prctl",
    "brk",
    "clock_gettime",
    "clock_nanosleep",
    "close",
    "dup",
    "dup2",
    "dup3",
    "epoll_create1",
    "epoll_ctl",
    "epoll_pwait",
    "epoll_wait",
    "eventfd2",
    "execve",
    "exit",
    "exit_group",
    "fcntl",
    "fstat",
    "futex",
    "getdents64",
    "getegid",
    "geteuid",
    "getgid",
    "getpid",
    "getrandom",
    "gettid",
    "getuid",
    "ioctl",
    "lseek",
    "madvise",
    "mmap",
    "mprotect",
    "munmap",
    "nanosleep",
    "newfstatat",
    "openat",
    "pipe2",
    "poll",
    "ppoll",
    "pread64",
    "prlimit64",
    "read",
    "readlink",
    "rseq",
    "rt_sigaction",
    "rt_sigprocmask",
    "rt_sigreturn",
    "sched_yield",
    "set_robust_list",
    "set_tid_address",
    "sigaltstack",
    "statx",
    "uname",
    "write",
    "writev",
];

/// Seccomp whitelist for one confinement domain.
#[derive(Debug, Clone)]
pub struct SeccompProfile {
    /// Security tag of the domain.
    pub tag: SecurityTag,
    /// Interface fragments for the domain.
    pub body: Bytes,
}

impl SeccompProfile {
    /// Create a whitelist around composed fragments.
    #[must_use]
    pub const fn new(tag: SecurityTag, body: Bytes) -> Self {
        Self { tag, body }
    }

    /// Render the whitelist source.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + BASE_SYSCALLS.len() * 12);
        out.extend_from_slice(format!("# Seccomp whitelist for {}\n", self.tag).as_bytes());
        for syscall in BASE_SYSCALLS {
            out.extend_from_slice(syscall.as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(&self.body);
        out
    }

    /// Syscall names allowed by the whitelist, first occurrence order.
    #[must_use]
    pub fn syscalls(&self) -> Vec<String> {
        let rendered = self.render();
        let text = String::from_utf8_lossy(&rendered);
        let mut seen = std::collections::HashSet::new();
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_whitespace().next())
            .filter(|name| seen.insert(name.to_string()))
            .map(str::to_string)
            .collect()
    }
}
