//! Packaging Pipeline
//!
//! A strictly ordered list of named steps. Each step runs only after every
//! earlier step succeeded; the first failure stops the pipeline and nothing
//! already written is rolled back.

use std::future::Future;
use futures::future::{BoxFuture, FutureExt};
use tracing::{info, error};

use crate::BuildError;

type StepAction<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), BuildError>> + Send + 'a>;

/// A named unit of packaging work
pub struct PackagingStep<'a> {
    name: String,
    action: StepAction<'a>,
}

impl<'a> PackagingStep<'a> {
    pub fn new<F, Fut>(name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), BuildError>> + Send + 'a,
    {
        Self {
            name: name.into(),
            action: Box::new(move || action().boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered sequence of packaging steps
pub struct Pipeline<'a> {
    name: String,
    steps: Vec<PackagingStep<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn step<F, Fut>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), BuildError>> + Send + 'a,
    {
        self.steps.push(PackagingStep::new(name, action));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(PackagingStep::name).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(self) -> Result<(), BuildError> {
        let total = self.steps.len();
        info!("{}: {} steps", self.name, total);

        for (index, step) in self.steps.into_iter().enumerate() {
            info!("[{}/{}] {}", index + 1, total, step.name);
            if let Err(e) = (step.action)().await {
                error!("{} failed at step '{}': {}", self.name, step.name, e);
                return Err(BuildError::Step {
                    step: step.name,
                    source: Box::new(e),
                });
            }
        }

        info!("{} finished", self.name);
        Ok(())
    }
}
