use serde::Serialize;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use tracing::info;

use crate::error::ReportError;
use crate::network::{Network, RunSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: usize,
    pub total_served: u64,
    pub total_reads: u64,
    pub total_writes: u64,
    pub max_queue_len: usize,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub id: usize,
    pub total_accesses: u64,
    pub total_reads: u64,
    pub total_writes: u64,
    pub responses: u64,
    pub average_wait_time: f64,
    pub wait_time_std_dev: f64,
    pub accesses_per_second: f64,
    pub mean_access_interval: f64,
    pub access_interval_std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub served: u64,
    pub reads: u64,
    pub writes: u64,
    pub cancelled_in_service: usize,
    pub discarded_queued: usize,
    pub dropped_responses: u64,
    pub mean_wait_time: f64,
}

/// End-of-run statistics for every table and user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub elapsed: f64,
    pub tables: Vec<TableRow>,
    pub users: Vec<UserRow>,
    pub totals: Totals,
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.
    } else {
        statistical::mean(samples)
    }
}

fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        0.
    } else {
        statistical::standard_deviation(samples, None)
    }
}

impl Report {
    pub fn collect(qn: &Network, summary: &RunSummary) -> Report {
        let elapsed = summary.end_time;

        let tables: Vec<TableRow> = qn
            .tables()
            .iter()
            .map(|t| {
                let c = t.counters();
                TableRow {
                    id: t.get_id(),
                    total_served: c.total_served,
                    total_reads: c.total_reads,
                    total_writes: c.total_writes,
                    max_queue_len: c.max_queue_len,
                    utilization: if elapsed > 0. { t.busy_time() / elapsed } else { 0. },
                }
            })
            .collect();

        let users: Vec<UserRow> = qn
            .users()
            .iter()
            .map(|u| {
                let s = u.stats();
                UserRow {
                    id: u.get_id(),
                    total_accesses: s.issued,
                    total_reads: s.reads,
                    total_writes: s.writes,
                    responses: s.responses,
                    average_wait_time: s.average_wait(),
                    wait_time_std_dev: std_dev(&s.wait_times),
                    accesses_per_second: s.accesses_per_second(elapsed),
                    mean_access_interval: mean(&s.access_intervals),
                    access_interval_std_dev: std_dev(&s.access_intervals),
                }
            })
            .collect();

        let all_waits: Vec<f64> = qn
            .users()
            .iter()
            .flat_map(|u| u.stats().wait_times.iter().cloned())
            .collect();

        let totals = Totals {
            served: tables.iter().map(|t| t.total_served).sum(),
            reads: tables.iter().map(|t| t.total_reads).sum(),
            writes: tables.iter().map(|t| t.total_writes).sum(),
            cancelled_in_service: summary.cancelled_in_service,
            discarded_queued: summary.discarded_queued,
            dropped_responses: qn.dropped_responses(),
            mean_wait_time: mean(&all_waits),
        };

        Report {
            elapsed,
            tables,
            users,
            totals,
        }
    }

    pub fn log_summary(&self) {
        for t in self.tables.iter() {
            info!(
                table = t.id,
                served = t.total_served,
                reads = t.total_reads,
                writes = t.total_writes,
                max_queue = t.max_queue_len,
                utilization = t.utilization,
                "Table statistics"
            );
        }
        for u in self.users.iter() {
            info!(
                user = u.id,
                accesses = u.total_accesses,
                reads = u.total_reads,
                writes = u.total_writes,
                responses = u.responses,
                avg_wait = u.average_wait_time,
                std_wait = u.wait_time_std_dev,
                accesses_per_second = u.accesses_per_second,
                mean_interval = u.mean_access_interval,
                "User statistics"
            );
        }
        info!(
            elapsed = self.elapsed,
            served = self.totals.served,
            reads = self.totals.reads,
            writes = self.totals.writes,
            cancelled = self.totals.cancelled_in_service,
            discarded = self.totals.discarded_queued,
            mean_wait = self.totals.mean_wait_time,
            "Run totals"
        );
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_err)?;
        file.write_all(self.to_json()?.as_bytes()).map_err(io_err)?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }
}
