use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::RequestError;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Service duration used when the originator does not supply one.
pub const DEFAULT_SERVICE_TIME: f64 = 1.0;

pub type UserId = usize;

/// A validated, finite and non-negative service duration.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct ServiceTime(f64);

impl ServiceTime {
    pub fn new(value: f64) -> Result<Self, RequestError> {
        if !value.is_finite() || value < 0. {
            return Err(RequestError::InvalidServiceTime(value));
        }
        Ok(ServiceTime(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for ServiceTime {
    fn default() -> Self {
        ServiceTime(DEFAULT_SERVICE_TIME)
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    pub fn is_read(self) -> bool {
        self == AccessKind::Read
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "READ"),
            AccessKind::Write => write!(f, "WRITE"),
        }
    }
}

/// One pending or in-flight access to a table.
#[derive(PartialEq, Clone, Debug)]
pub struct Request {
    id: u64,
    kind: AccessKind,
    user: Option<UserId>,
    arrival: f64,
    service_time: f64,
}

impl Request {
    pub fn new(kind: AccessKind, user: Option<UserId>, arrival: f64) -> Self {
        Request {
            id: REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed),
            kind,
            user,
            arrival,
            service_time: DEFAULT_SERVICE_TIME,
        }
    }

    pub fn read(user: UserId, arrival: f64) -> Self {
        Request::new(AccessKind::Read, Some(user), arrival)
    }

    pub fn write(user: UserId, arrival: f64) -> Self {
        Request::new(AccessKind::Write, Some(user), arrival)
    }

    pub fn with_service_time(mut self, service_time: ServiceTime) -> Self {
        self.service_time = service_time.0;
        self
    }

    pub fn get_id(&self) -> u64 {
        self.id
    }

    pub fn get_kind(&self) -> AccessKind {
        self.kind
    }

    pub fn get_user(&self) -> Option<UserId> {
        self.user
    }

    pub fn get_arrival(&self) -> f64 {
        self.arrival
    }

    pub fn get_service_time(&self) -> f64 {
        self.service_time
    }
}

/// Answer sent back to the originating user once service completes.
#[derive(PartialEq, Clone, Debug)]
pub struct Response {
    pub request: u64,
    pub table: usize,
    pub user: Option<UserId>,
    pub kind: AccessKind,
    pub arrival: f64,
    pub started: f64,
    pub completed: f64,
}

impl Response {
    pub fn wait_time(&self) -> f64 {
        self.completed - self.arrival
    }
}
