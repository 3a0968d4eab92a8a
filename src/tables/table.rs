//! Reader/writer admission control for a single table.
//!
//! Requests queue up in arrival order and leave the queue only from the front.
//! Whenever the table is completely idle, the front of the queue is admitted:
//! either a single write, or every read up to the first write (a batch).
//! Reads arriving while a batch is running wait until that whole batch drains.
//!
//! Two delivery entry points exist. [`Table::on_request_arrival`] (and
//! [`Table::handle_event`]) admit after each single arrival; this is what
//! [`crate::network::Network`] uses, so reads reaching an idle table one by one
//! start one by one. [`Table::on_request_arrivals`] takes every request that
//! arrives at the same instant, queues them all and admits once, so reads
//! delivered together at an idle table form one batch.

use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, info, warn};

use crate::helpers::float_binaryheap::FloatBinaryHeap;
use crate::tables::request::{AccessKind, Request, Response};
use crate::tables::EventSource;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct CompletionToken(u64);

#[derive(Debug)]
pub enum TableEvent {
    Request(Request),
    ServiceCompletion(CompletionToken),
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Phase {
    Idle,
    ReadersActive,
    WriterActive,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct TableState {
    pub active_readers: usize,
    pub writer_active: bool,
}

impl TableState {
    pub fn is_idle(&self) -> bool {
        self.active_readers == 0 && !self.writer_active
    }

    pub fn is_consistent(&self) -> bool {
        !(self.writer_active && self.active_readers > 0)
    }

    pub fn phase(&self) -> Phase {
        if self.writer_active {
            Phase::WriterActive
        } else if self.active_readers > 0 {
            Phase::ReadersActive
        } else {
            Phase::Idle
        }
    }
}

#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct TableCounters {
    pub total_served: u64,
    pub total_reads: u64,
    pub total_writes: u64,
    pub max_queue_len: usize,
    pub clamped_decrements: u64,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct ShutdownReport {
    pub cancelled_in_service: usize,
    pub discarded_queued: usize,
}

struct InService {
    req: Request,
    started: f64,
}

pub struct Table {
    id: usize,
    time: f64,
    queue: VecDeque<Request>,
    state: TableState,
    in_service: HashMap<CompletionToken, InService>,
    next_exits: FloatBinaryHeap<CompletionToken>,
    next_token: u64,
    counters: TableCounters,
    busy_time: f64,
    busy_since: Option<f64>,
}

impl Table {
    pub fn new(id: usize) -> Self {
        debug!(table = id, "Table initialized");
        Table {
            id,
            time: 0.,
            queue: VecDeque::new(),
            state: TableState::default(),
            in_service: HashMap::new(),
            next_exits: FloatBinaryHeap::new(),
            next_token: 0,
            counters: TableCounters::default(),
            busy_time: 0.,
            busy_since: None,
        }
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn counters(&self) -> TableCounters {
        self.counters
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_service_len(&self) -> usize {
        self.in_service.len()
    }

    /// Simulated time spent non-idle, including a busy period still open at the current time.
    pub fn busy_time(&self) -> f64 {
        match self.busy_since {
            Some(since) => self.busy_time + (self.time - since),
            None => self.busy_time,
        }
    }

    pub fn handle_event(&mut self, event: TableEvent) -> Option<Response> {
        match event {
            TableEvent::Request(req) => {
                self.on_request_arrival(req);
                None
            }
            TableEvent::ServiceCompletion(token) => self.on_service_completion(token),
        }
    }

    pub fn on_request_arrival(&mut self, req: Request) {
        debug!(
            table = self.id,
            user = ?req.get_user(),
            kind = %req.get_kind(),
            time = self.time,
            "Request received"
        );
        self.enqueue(req);
        self.admit();
    }

    pub fn on_request_arrivals<I>(&mut self, reqs: I)
    where
        I: IntoIterator<Item = Request>,
    {
        for req in reqs {
            debug!(
                table = self.id,
                user = ?req.get_user(),
                kind = %req.get_kind(),
                time = self.time,
                "Request received"
            );
            self.enqueue(req);
        }
        self.admit();
    }

    pub fn on_service_completion(&mut self, token: CompletionToken) -> Option<Response> {
        let InService { req, started } = match self.in_service.remove(&token) {
            Some(entry) => entry,
            None => {
                warn!(table = self.id, token = ?token, time = self.time, "Completion for unknown request, ignored");
                return None;
            }
        };

        match req.get_kind() {
            AccessKind::Read => match self.state.active_readers.checked_sub(1) {
                Some(readers) => self.state.active_readers = readers,
                None => {
                    error!(table = self.id, time = self.time, "Active reader count would go negative, clamped to 0");
                    self.counters.clamped_decrements += 1;
                    self.state.active_readers = 0;
                }
            },
            AccessKind::Write => self.state.writer_active = false,
        }

        self.counters.total_served += 1;
        match req.get_kind() {
            AccessKind::Read => self.counters.total_reads += 1,
            AccessKind::Write => self.counters.total_writes += 1,
        }

        if self.state.is_idle() {
            self.close_busy_period();
        }

        let response = Response {
            request: req.get_id(),
            table: self.id,
            user: req.get_user(),
            kind: req.get_kind(),
            arrival: req.get_arrival(),
            started,
            completed: self.time,
        };

        debug!(
            table = self.id,
            user = ?req.get_user(),
            kind = %req.get_kind(),
            time = self.time,
            "Service finished"
        );

        self.admit();
        Some(response)
    }

    /// Starts whatever the front of the queue allows. Returns how many
    /// requests were admitted; 0 whenever the table is not idle.
    pub fn admit(&mut self) -> usize {
        if !self.state.is_idle() {
            return 0;
        }

        let front_kind = match self.queue.front() {
            Some(req) => req.get_kind(),
            None => return 0,
        };

        match front_kind {
            AccessKind::Write => match self.queue.pop_front() {
                Some(req) => {
                    self.state.writer_active = true;
                    self.start_service(req);
                    1
                }
                None => 0,
            },
            AccessKind::Read => {
                let batch_len = self
                    .queue
                    .iter()
                    .take_while(|r| r.get_kind().is_read())
                    .count();
                let batch: Vec<Request> = self.queue.drain(..batch_len).collect();
                self.state.active_readers = batch.len();
                for req in batch {
                    self.start_service(req);
                }
                batch_len
            }
        }
    }

    pub fn shutdown(&mut self) -> ShutdownReport {
        let report = ShutdownReport {
            cancelled_in_service: self.in_service.len(),
            discarded_queued: self.queue.len(),
        };

        self.next_exits.clear();
        self.in_service.clear();
        self.queue.clear();
        self.state = TableState::default();
        self.close_busy_period();

        info!(
            table = self.id,
            time = self.time,
            cancelled = report.cancelled_in_service,
            discarded = report.discarded_queued,
            "Table shut down"
        );
        report
    }

    fn enqueue(&mut self, req: Request) {
        self.queue.push_back(req);
        if self.queue.len() > self.counters.max_queue_len {
            self.counters.max_queue_len = self.queue.len();
        }
    }

    fn start_service(&mut self, req: Request) {
        let token = CompletionToken(self.next_token);
        self.next_token += 1;

        if self.busy_since.is_none() {
            self.busy_since = Some(self.time);
        }

        debug!(
            table = self.id,
            user = ?req.get_user(),
            kind = %req.get_kind(),
            time = self.time,
            service_time = req.get_service_time(),
            "Service started"
        );

        self.next_exits.push(self.time + req.get_service_time(), token);
        self.in_service.insert(
            token,
            InService {
                req,
                started: self.time,
            },
        );
    }

    fn close_busy_period(&mut self) {
        if let Some(since) = self.busy_since.take() {
            self.busy_time += self.time - since;
        }
    }
}

impl EventSource for Table {
    type Exit = CompletionToken;

    fn update_time(&mut self, time: f64) {
        self.time = time;
    }

    fn read_next_exit(&self) -> Option<f64> {
        self.next_exits.peek().map(|(t, _)| t)
    }

    fn pop_next_exit(&mut self) -> Option<(f64, CompletionToken)> {
        self.next_exits.pop()
    }
}
