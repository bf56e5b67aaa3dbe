//! Executes rules against a loaded feed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::notice::{Notice, NoticeAggregator, NoticeContainer, Severity};
use crate::table::Feed;

use super::Rule;

/// Code of the notice that replaces the output of a failed rule.
pub const RUNTIME_EXCEPTION_CODE: &str = "runtime_exception_in_validator_error";

/// What happened to one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ran,
    Skipped,
    Failed,
    Cancelled,
}

/// Bookkeeping for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub rules_run: usize,
    /// Rules whose required tables were not all loaded.
    pub rules_skipped: Vec<String>,
    /// Rules that returned an error or panicked.
    pub rules_failed: Vec<String>,
    /// Set when cancellation stopped at least one rule from starting.
    pub cancelled: bool,
}

/// Runs a fixed list of rules, in parallel or one after another.
///
/// Rule `i` writes into aggregator slot `i + 1`; slot 0 belongs to the
/// loader. Output order therefore follows registry order regardless of
/// scheduling.
pub struct RuleRunner {
    rules: Vec<Box<dyn Rule>>,
    parallel: bool,
    threads: Option<usize>,
}

impl RuleRunner {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            rules,
            parallel: true,
            threads: None,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use a dedicated pool of `threads` workers instead of rayon's global pool.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Run every rule whose tables are loaded.
    ///
    /// Rules not yet started when `cancel` is set are not run. Only a thread
    /// pool that cannot be built makes this fail.
    pub fn run(&self, feed: &Feed, aggregator: &NoticeAggregator, cancel: &AtomicBool) -> Result<RunOutcome> {
        let statuses: Vec<Status> = if self.parallel {
            let run_all = || -> Vec<Status> {
                self.rules
                    .par_iter()
                    .enumerate()
                    .map(|(i, rule)| self.run_one(i, rule.as_ref(), feed, aggregator, cancel))
                    .collect()
            };
            match self.threads {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?
                    .install(run_all),
                None => run_all(),
            }
        } else {
            self.rules
                .iter()
                .enumerate()
                .map(|(i, rule)| self.run_one(i, rule.as_ref(), feed, aggregator, cancel))
                .collect()
        };

        let mut outcome = RunOutcome::default();
        for (rule, status) in self.rules.iter().zip(statuses) {
            match status {
                Status::Ran => outcome.rules_run += 1,
                Status::Skipped => outcome.rules_skipped.push(rule.name().to_string()),
                Status::Failed => {
                    outcome.rules_run += 1;
                    outcome.rules_failed.push(rule.name().to_string());
                }
                Status::Cancelled => outcome.cancelled = true,
            }
        }
        Ok(outcome)
    }

    fn run_one(
        &self,
        index: usize,
        rule: &dyn Rule,
        feed: &Feed,
        aggregator: &NoticeAggregator,
        cancel: &AtomicBool,
    ) -> Status {
        if cancel.load(Ordering::Relaxed) {
            return Status::Cancelled;
        }

        let missing: Vec<&str> = rule
            .required_tables()
            .into_iter()
            .filter(|t| !feed.has_table(t))
            .collect();
        if !missing.is_empty() {
            debug!(rule = rule.name(), missing = ?missing, "Skipping rule");
            return Status::Skipped;
        }

        let mut notices = aggregator.container();
        let result = panic::catch_unwind(AssertUnwindSafe(|| rule.validate(feed, &mut notices)));

        let (status, notices) = match result {
            Ok(Ok(())) => {
                debug!(rule = rule.name(), notices = notices.severity_counts().total(), "Rule finished");
                (Status::Ran, notices)
            }
            Ok(Err(err)) => {
                warn!(rule = rule.name(), error = %err, "Rule failed");
                (Status::Failed, fault(aggregator, rule.name(), err.kind(), &err.to_string()))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(rule = rule.name(), %message, "Rule panicked");
                (Status::Failed, fault(aggregator, rule.name(), "panic", &message))
            }
        };
        aggregator.merge(index + 1, notices);
        status
    }
}

/// A container holding only the fault notice; partial output is dropped.
fn fault(aggregator: &NoticeAggregator, rule: &str, exception: &str, message: &str) -> NoticeContainer {
    let mut notices = aggregator.container();
    notices.push(
        Notice::new(RUNTIME_EXCEPTION_CODE, Severity::Error)
            .with_field("validator", rule)
            .with_field("exception", exception)
            .with_field("message", message),
    );
    notices
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
