use std::io::{self, Read};
use std::process::Stdio;

use log::{debug, info};
use tokio::process::Command;

use crate::error::BridgeError;

pub const DEFAULT_LOCAL_PORT: u16 = 54321;
pub const DEFAULT_REMOTE_PORT: u16 = 12345;
pub const DEFAULT_TOOL: &str = "adb";

/// An `adb forward tcp:<local> tcp:<remote>` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub tool: String,
    pub local_port: u16,
    pub remote_port: u16,
}

impl Default for ForwardRequest {
    fn default() -> Self {
        ForwardRequest {
            tool: DEFAULT_TOOL.to_string(),
            local_port: DEFAULT_LOCAL_PORT,
            remote_port: DEFAULT_REMOTE_PORT,
        }
    }
}

impl ForwardRequest {
    pub fn args(&self) -> [String; 3] {
        [
            "forward".to_string(),
            format!("tcp:{}", self.local_port),
            format!("tcp:{}", self.remote_port),
        ]
    }

    pub fn command_line(&self) -> String {
        format!("{} {}", self.tool, self.args().join(" "))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.tool);
        cmd.args(self.args());
        cmd
    }
}

/// What a finished bridge process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardResult {
    pub status: Option<i32>,
    /// stdout and stderr as one stream, in write order, lossily decoded.
    pub output: String,
}

impl ForwardResult {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn into_verdict(self, command: String) -> Result<ForwardResult, BridgeError> {
        if self.success() {
            Ok(self)
        } else {
            Err(BridgeError::Exit {
                command,
                status: self.status,
                output: self.output,
            })
        }
    }
}

/// Runs the bridging tool once and succeeds only on a zero exit status.
pub async fn setup_forward(req: &ForwardRequest) -> Result<ForwardResult, BridgeError> {
    let command_line = req.command_line();
    info!("Setting up port forward: {}", command_line);

    let finished = run_captured(req.command(), &command_line).await;
    let verdict = finished.and_then(|res| res.into_verdict(command_line));

    if let Ok(res) = &verdict {
        info!(
            "Forwarding 127.0.0.1:{} to device port {}",
            req.local_port, req.remote_port
        );
        if !res.output.trim().is_empty() {
            debug!("Bridge output: {}", res.output.trim_end());
        }
    }

    verdict
}

/// Spawns `cmd` with stdout and stderr sharing one pipe back to us and no
/// stdin, draining the pipe until the child exits. The child, the pipe and
/// every copy of its write end are dropped before this returns on every path.
async fn run_captured(mut cmd: Command, command_line: &str) -> Result<ForwardResult, BridgeError> {
    let pipe_err = |source: io::Error| BridgeError::Pipe {
        command: command_line.to_string(),
        source,
    };

    let (mut reader, writer) = io::pipe().map_err(pipe_err)?;
    let writer_err = writer.try_clone().map_err(pipe_err)?;

    debug!("Spawning `{}`", command_line);
    let spawned = cmd
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_err)
        .kill_on_drop(true)
        .spawn();
    // The command still owns our copies of the write end; the reader only
    // sees EOF once they are closed.
    drop(cmd);
    let mut child = spawned.map_err(|source| BridgeError::Spawn {
        command: command_line.to_string(),
        source,
    })?;

    let drain = tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map(|_| buf)
    });

    let status = child.wait().await.map_err(pipe_err)?;
    let captured = drain
        .await
        .map_err(io::Error::other)
        .and_then(|read| read)
        .map_err(pipe_err)?;

    Ok(ForwardResult {
        status: status.code(),
        output: String::from_utf8_lossy(&captured).into_owned(),
    })
}
