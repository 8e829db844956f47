use std::fmt;
use std::sync::Arc;

/// What a transform stage does after its user function fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Close the output and end the stage; no further input is read
    Stop,
    /// Drop the failed value and continue with the next one
    #[default]
    Ignore,
}

/// Maps a user-function error to a [`Decision`].
///
/// The error is passed exactly as the user function returned it.
pub type ErrorPolicy<E> = Arc<dyn Fn(&E) -> Decision + Send + Sync>;

/// Policy that discards every failed value (the default)
pub fn ignore_errors<E: 'static>() -> ErrorPolicy<E> {
    Arc::new(|_: &E| Decision::Ignore)
}

/// Policy that ends the stage at the first failure
pub fn stop_on_error<E: 'static>() -> ErrorPolicy<E> {
    Arc::new(|_: &E| Decision::Stop)
}

/// One setting applied on top of the stage defaults
pub enum StageOption<E> {
    OutputCapacity(usize),
    ErrorPolicy(ErrorPolicy<E>),
    Name(String),
}

// Manual impls: `E` itself need not be `Clone` or `Debug`.
impl<E> Clone for StageOption<E> {
    fn clone(&self) -> Self {
        match self {
            StageOption::OutputCapacity(n) => StageOption::OutputCapacity(*n),
            StageOption::ErrorPolicy(policy) => StageOption::ErrorPolicy(Arc::clone(policy)),
            StageOption::Name(name) => StageOption::Name(name.clone()),
        }
    }
}

impl<E> fmt::Debug for StageOption<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOption::OutputCapacity(n) => f.debug_tuple("OutputCapacity").field(n).finish(),
            StageOption::ErrorPolicy(_) => f.write_str("ErrorPolicy(..)"),
            StageOption::Name(name) => f.debug_tuple("Name").field(name).finish(),
        }
    }
}

/// Capacity of the stage's output queue; 0 makes it a rendezvous queue
pub fn with_output_capacity<E>(capacity: usize) -> StageOption<E> {
    StageOption::OutputCapacity(capacity)
}

/// Decide what happens when the stage's user function fails
pub fn with_error_policy<E, P>(policy: P) -> StageOption<E>
where
    P: Fn(&E) -> Decision + Send + Sync + 'static,
{
    StageOption::ErrorPolicy(Arc::new(policy))
}

/// Label the stage in logs and stats
pub fn with_name<E>(name: impl Into<String>) -> StageOption<E> {
    StageOption::Name(name.into())
}

/// Resolved settings for one stage invocation
pub struct StageConfig<E> {
    pub output_capacity: usize,
    pub error_policy: ErrorPolicy<E>,
    pub name: Option<String>,
}

impl<E: 'static> StageConfig<E> {
    /// Apply `options` in order on top of the defaults; later options win
    pub fn resolve(options: &[StageOption<E>]) -> Self {
        let mut config = Self::default();
        for option in options {
            match option {
                StageOption::OutputCapacity(n) => config.output_capacity = *n,
                StageOption::ErrorPolicy(policy) => config.error_policy = Arc::clone(policy),
                StageOption::Name(name) => config.name = Some(name.clone()),
            }
        }
        config
    }

    /// Consult the error policy
    pub fn decide(&self, err: &E) -> Decision {
        (self.error_policy)(err)
    }

    pub(crate) fn label(&self, kind: &str) -> String {
        self.name.clone().unwrap_or_else(|| kind.to_string())
    }
}

impl<E: 'static> Default for StageConfig<E> {
    fn default() -> Self {
        Self {
            output_capacity: 0,
            error_policy: ignore_errors(),
            name: None,
        }
    }
}

impl<E> fmt::Debug for StageConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageConfig")
            .field("output_capacity", &self.output_capacity)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
