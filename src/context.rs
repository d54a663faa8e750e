use std::time::Duration;

use crate::forward::ForwardRequest;

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);

/// Everything a relay run needs, fixed once at startup.
#[derive(Debug, Clone)]
pub struct RelayContext {
    pub request: ForwardRequest,
    /// Pause between a successful forward and the connect attempt, giving
    /// adb time to install the rule.
    pub settle: Duration,
}

impl Default for RelayContext {
    fn default() -> Self {
        RelayContext {
            request: ForwardRequest::default(),
            settle: DEFAULT_SETTLE,
        }
    }
}
