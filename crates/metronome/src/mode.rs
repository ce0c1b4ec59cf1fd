//! Concurrency policy for recurring actions

/// How a beat executor runs the caller's action when beats arrive faster
/// than the action completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecurringJobMode {
    /// A new beat cancels any still-running invocation before starting its
    /// own. At most one invocation is active, a slow action never blocks
    /// later beats, and a superseded invocation never completes.
    #[default]
    CancellingSequential,
    /// Every beat's action launches as an independent task. Invocations may
    /// overlap; the executor returns once the pulse ends and all launched
    /// invocations have completed.
    Concurrent,
    /// Each action is awaited before the next beat is generated, so a slow
    /// action stretches the observed period.
    DelayBetweenSequential,
}

#[cfg(test)]
mod tests {
    //! Unit tests for the mode enum.
    use super::*;

    /// Validates the `RecurringJobMode` default.
    ///
    /// Assertions:
    /// - Confirms the default mode is `CancellingSequential`.
    #[test]
    fn test_default_mode_is_cancelling_sequential() {
        assert_eq!(RecurringJobMode::default(), RecurringJobMode::CancellingSequential);
    }
}
