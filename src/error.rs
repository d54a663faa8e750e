use std::io;

use thiserror::Error;

/// Failures of the `adb forward` stage.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to collect output of `{command}`: {source}")]
    Pipe {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {}", describe_status(.status))]
    Exit {
        command: String,
        /// `None` when the tool was terminated by a signal.
        status: Option<i32>,
        output: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match *status {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Failures that keep the stream client from ever reading.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to create TCP socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl RelayError {
    /// Process exit code for this failure. Each fatal path has its own code.
    pub fn exit_code(&self) -> u8 {
        match self {
            RelayError::Bridge(BridgeError::Pipe { .. }) => 10,
            RelayError::Bridge(BridgeError::Spawn { .. }) => 11,
            RelayError::Bridge(BridgeError::Exit { .. }) => 12,
            RelayError::Stream(StreamError::Socket(_)) => 20,
            RelayError::Stream(StreamError::Connect { .. }) => 21,
        }
    }

    /// What the bridging tool printed before failing, if anything.
    pub fn diagnostic_output(&self) -> Option<&str> {
        match self {
            RelayError::Bridge(BridgeError::Exit { output, .. }) => {
                Some(output.trim_end()).filter(|text| !text.is_empty())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_non_zero() {
        let addr = "127.0.0.1:54321".parse().unwrap();
        let errors: Vec<RelayError> = vec![
            BridgeError::Pipe {
                command: "adb".into(),
                source: io::Error::from(io::ErrorKind::BrokenPipe),
            }
            .into(),
            BridgeError::Spawn {
                command: "adb".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }
            .into(),
            BridgeError::Exit {
                command: "adb".into(),
                status: Some(1),
                output: String::new(),
            }
            .into(),
            StreamError::Socket(io::Error::from(io::ErrorKind::Other)).into(),
            StreamError::Connect {
                addr,
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }
            .into(),
        ];

        let mut codes: Vec<u8> = errors.iter().map(RelayError::exit_code).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn diagnostic_output_only_for_tool_exit() {
        let failed: RelayError = BridgeError::Exit {
            command: "adb forward tcp:54321 tcp:12345".into(),
            status: Some(1),
            output: "error: device not found\n".into(),
        }
        .into();
        assert_eq!(failed.diagnostic_output(), Some("error: device not found"));

        let silent: RelayError = BridgeError::Exit {
            command: "adb".into(),
            status: Some(1),
            output: String::new(),
        }
        .into();
        assert_eq!(silent.diagnostic_output(), None);

        let refused: RelayError = StreamError::Connect {
            addr: "127.0.0.1:54321".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        }
        .into();
        assert_eq!(refused.diagnostic_output(), None);
    }

    #[test]
    fn exit_error_message_names_status() {
        let err = BridgeError::Exit {
            command: "adb forward tcp:54321 tcp:12345".into(),
            status: Some(1),
            output: "device not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "`adb forward tcp:54321 tcp:12345` exited with status 1"
        );

        let killed = BridgeError::Exit {
            command: "adb".into(),
            status: None,
            output: String::new(),
        };
        assert!(killed.to_string().contains("terminated by signal"));
    }
}
