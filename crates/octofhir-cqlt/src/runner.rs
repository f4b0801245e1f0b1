//! Test runner
//!
//! Runs each test case's bundle through a [`CqlExecutor`] and checks the
//! results against the case's expectations. Cases run one at a time; an
//! executor failure marks that case errored and the run moves on.

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::executor::{CqlExecutor, ExecutionRequest, InMemoryValueSets, LibraryRef, ValueSetResolver};
use chrono::{DateTime, FixedOffset};
use octofhir_cqlt_assert::{AssertionFailure, check_all};
use octofhir_cqlt_fixture::TestCase;
use std::fmt;
use std::sync::Arc;

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq)]
pub enum TestStatus {
    Passed,
    /// One entry per expectation that did not hold
    Failed(Vec<AssertionFailure>),
    Skipped,
    /// The executor could not produce results
    Errored(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
}

impl TestOutcome {
    fn new(name: &str, status: TestStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            TestStatus::Passed => write!(f, "PASS {}", self.name),
            TestStatus::Skipped => write!(f, "SKIP {}", self.name),
            TestStatus::Errored(message) => write!(f, "ERROR {}: {}", self.name, message),
            TestStatus::Failed(failures) => {
                write!(f, "FAIL {}", self.name)?;
                for failure in failures {
                    write!(f, "\n  {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

/// Outcomes of a whole run, in case order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Skipped))
    }

    pub fn errored(&self) -> usize {
        self.count(|s| matches!(s, TestStatus::Errored(_)))
    }

    /// No failures and no errors
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    fn count(&self, predicate: impl Fn(&TestStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{}", outcome)?;
        }
        write!(
            f,
            "{} passed, {} failed, {} errored, {} skipped",
            self.passed(),
            self.failed(),
            self.errored(),
            self.skipped()
        )
    }
}

/// Runs test cases against one CQL library
pub struct TestHarness {
    executor: Arc<dyn CqlExecutor>,
    library: LibraryRef,
    value_sets: Arc<dyn ValueSetResolver>,
    execution_date: Option<DateTime<FixedOffset>>,
}

impl TestHarness {
    pub fn new(executor: Arc<dyn CqlExecutor>, library: LibraryRef) -> Self {
        Self {
            executor,
            library,
            value_sets: Arc::new(InMemoryValueSets::new()),
            execution_date: None,
        }
    }

    pub fn from_config(config: &HarnessConfig, executor: Arc<dyn CqlExecutor>) -> HarnessResult<Self> {
        Ok(Self::new(executor, config.library.clone()).with_execution_date(config.execution_date()?))
    }

    pub fn with_value_sets(mut self, value_sets: Arc<dyn ValueSetResolver>) -> Self {
        self.value_sets = value_sets;
        self
    }

    pub fn with_execution_date(mut self, date: Option<DateTime<FixedOffset>>) -> Self {
        self.execution_date = date;
        self
    }

    pub fn library(&self) -> &LibraryRef {
        &self.library
    }

    /// Run every case in order. When any case is marked `only`, the
    /// others are reported skipped.
    pub async fn run(&self, cases: &[TestCase]) -> SuiteReport {
        let focused = cases.iter().any(|case| case.only);
        let mut report = SuiteReport::default();
        for case in cases {
            let outcome = if focused && !case.only {
                TestOutcome::new(&case.name, TestStatus::Skipped)
            } else {
                self.run_case(case).await
            };
            log::info!("{}", outcome);
            report.outcomes.push(outcome);
        }
        report
    }

    /// Run a single case, ignoring focus
    pub async fn run_case(&self, case: &TestCase) -> TestOutcome {
        let Some(bundle) = case.bundle.as_ref().filter(|_| !case.skip) else {
            return TestOutcome::new(&case.name, TestStatus::Skipped);
        };

        let request = ExecutionRequest {
            library: &self.library,
            bundle,
            execution_date: self.execution_date,
            value_sets: Arc::clone(&self.value_sets),
        };
        let results = match self.executor.execute(request).await {
            Ok(results) => results,
            Err(e) => {
                return TestOutcome::new(&case.name, TestStatus::Errored(format!("[{}] {}", e.code(), e)));
            }
        };

        let failures = check_all(&results, &case.expectations);
        let status = if failures.is_empty() {
            TestStatus::Passed
        } else {
            TestStatus::Failed(failures)
        };
        TestOutcome::new(&case.name, status)
    }
}
