//! Test support utilities for dredge integration tests.
//!
//! Provides an isolated fake-runner environment for driving the
//! binary: a temp directory standing in for the runner workspace, with
//! GITHUB_OUTPUT / GITHUB_ENV pointed at files inside it.

#![allow(dead_code)]

use assert_cmd::Command;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::JoinHandle;
use tempfile::TempDir;

/// Input names the binary reads; cleared from the child environment so
/// tests never inherit values from the surrounding CI run.
const INPUTS: &[&str] = &[
    "INPUT_SECRETS",
    "INPUT_UNIVERSE",
    "INPUT_MIN_MASK_LENGTH",
    "INPUT_EXPORT_TO_ENVIRONMENT",
    "INPUT_ENCODING",
    "INPUT_ENTITLEMENT_URL",
];

/// Test environment with isolated temp directories.
///
/// No process-global state is mutated — child processes get their own
/// environment, so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory standing in for the runner workspace
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Path of the GITHUB_OUTPUT command file for this test.
    pub fn output_file(&self) -> PathBuf {
        self.dir.path().join("github_output")
    }

    /// Path of the GITHUB_ENV command file for this test.
    pub fn env_file(&self) -> PathBuf {
        self.dir.path().join("github_env")
    }

    /// Create a dredge command with a clean runner environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("dredge").expect("failed to find dredge binary");
        for input in INPUTS {
            cmd.env_remove(input);
        }
        cmd.env_remove("GITHUB_REPOSITORY");
        cmd.env_remove("GOOGLE_OAUTH_ACCESS_TOKEN");
        cmd.env("GITHUB_OUTPUT", self.output_file());
        cmd.env("GITHUB_ENV", self.env_file());
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Command with the `secrets` input set.
    pub fn cmd_with_secrets(&self, secrets: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.env("INPUT_SECRETS", secrets);
        cmd
    }
}

/// Serve exactly one HTTP request on a random local port, answering
/// with the given status, then shut down.
///
/// Returns the URL to point `INPUT_ENTITLEMENT_URL` at and the server
/// thread handle to join after the command exits.
pub fn serve_once(status: u16, reason: &'static str) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind listener");
    let addr = listener.local_addr().expect("listener has no address");

    let handle = std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            // Drain the request headers before answering.
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while let Ok(n) = stream.read(&mut buf) {
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {} {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status, reason
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (format!("http://{}/v1/entitlement", addr), handle)
}
