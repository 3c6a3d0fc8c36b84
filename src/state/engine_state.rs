/// Engine lifecycle definitions
///
/// The engine only moves forward: `Running -> Stopping -> Stopped`, or straight from
/// `Running` to `Stopped` when the queue runs dry.
use std::fmt;

/// Represents the lifecycle state of a crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// The loop is pulling and visiting queue items
    Running,

    /// A stop was requested and observed at an iteration boundary
    Stopping,

    /// The loop has exited (queue exhausted or stop completed)
    Stopped,
}

impl EngineState {
    /// Returns true if the engine has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Stopping)
                | (Self::Running, Self::Stopped)
                | (Self::Stopping, Self::Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
