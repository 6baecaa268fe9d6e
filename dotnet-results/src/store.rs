// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use coverage_report::CoverageRecord;
use flume::{Receiver, Sender};
use serde::Serialize;
use test_output::{TestOutcome, TestSummary};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The stored outcomes for `project` were replaced.
    TestRunRecorded { project: PathBuf },

    /// A batch of `files` coverage records was upserted.
    CoverageUpdated { files: usize },
}

/// Latest test outcomes per project and latest coverage per source file.
///
/// Owned by the application and passed by reference. Test runs replace the
/// previous run for the same project; coverage records replace the previous
/// record for the same file.
#[derive(Debug, Default)]
pub struct ResultStore {
    test_runs: BTreeMap<PathBuf, Vec<TestOutcome>>,
    coverage: BTreeMap<String, CoverageRecord>,
    subscribers: Vec<Sender<StoreEvent>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot<'a> {
    pub summary: TestSummary,
    pub overall_coverage: f64,
    pub test_runs: &'a BTreeMap<PathBuf, Vec<TestOutcome>>,
    pub coverage: &'a BTreeMap<String, CoverageRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    fn notify(&mut self, event: StoreEvent) {
        // drop subscribers whose receiver is gone
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn record_test_run(&mut self, project: impl Into<PathBuf>, outcomes: Vec<TestOutcome>) {
        let project = project.into();
        debug!(
            "recording {} test outcomes for {}",
            outcomes.len(),
            project.display()
        );

        self.test_runs.insert(project.clone(), outcomes);
        self.notify(StoreEvent::TestRunRecorded { project });
    }

    /// Upsert by file path. Does not notify; call
    /// [`ResultStore::notify_coverage_updated`] once the batch is complete.
    pub fn record_coverage(&mut self, record: CoverageRecord) {
        self.coverage.insert(record.file_path.clone(), record);
    }

    pub fn notify_coverage_updated(&mut self, files: usize) {
        self.notify(StoreEvent::CoverageUpdated { files });
    }

    /// Outcome counts across every project's latest run.
    pub fn summary(&self) -> TestSummary {
        TestSummary::from_outcomes(self.test_runs.values().flatten())
    }

    /// Unweighted mean of every file's percentage, or 0 with no files.
    pub fn overall_coverage(&self) -> f64 {
        if self.coverage.is_empty() {
            return 0.0;
        }

        let total: f64 = self.coverage.values().map(|r| r.percentage).sum();
        total / self.coverage.len() as f64
    }

    pub fn coverage_for_file(&self, path: &str) -> Option<&CoverageRecord> {
        self.coverage.get(path)
    }

    pub fn coverage(&self) -> impl Iterator<Item = &CoverageRecord> {
        self.coverage.values()
    }

    pub fn test_run(&self, project: &Path) -> Option<&[TestOutcome]> {
        self.test_runs.get(project).map(Vec::as_slice)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Path> {
        self.test_runs.keys().map(PathBuf::as_path)
    }

    pub fn test_runs(&self) -> impl Iterator<Item = (&Path, &[TestOutcome])> {
        self.test_runs
            .iter()
            .map(|(project, outcomes)| (project.as_path(), outcomes.as_slice()))
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            summary: self.summary(),
            overall_coverage: self.overall_coverage(),
            test_runs: &self.test_runs,
            coverage: &self.coverage,
        }
    }

    /// Forget all results. Subscribers stay registered.
    pub fn clear(&mut self) {
        self.test_runs.clear();
        self.coverage.clear();
    }
}
