use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Exp;
use tracing::debug;

use crate::error::ConfigError;
use crate::seed::{derive_seed, user_component};
use crate::tables::request::{AccessKind, Request, Response, ServiceTime, UserId};
use crate::tables::EventSource;
use crate::users::selection::TableSelector;

#[derive(PartialEq, Clone, Copy, Debug)]
pub struct UserParams {
    /// Access rate; inter-access delays are exponential with mean `1 / lambda`.
    pub lambda: f64,
    pub read_probability: f64,
    pub service_time: ServiceTime,
}

#[derive(PartialEq, Clone, Debug, Default)]
pub struct UserStats {
    pub issued: u64,
    pub reads: u64,
    pub writes: u64,
    pub responses: u64,
    pub total_wait: f64,
    pub wait_times: Vec<f64>,
    pub access_intervals: Vec<f64>,
}

impl UserStats {
    pub fn average_wait(&self) -> f64 {
        if self.responses > 0 {
            self.total_wait / self.responses as f64
        } else {
            0.
        }
    }

    pub fn accesses_per_second(&self, elapsed: f64) -> f64 {
        if elapsed > 0. {
            self.issued as f64 / elapsed
        } else {
            0.
        }
    }
}

pub fn user_rng(seed: Option<u64>, user: UserId) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(derive_seed(s, &user_component(user))),
        None => StdRng::from_entropy(),
    }
}

pub struct User {
    id: UserId,
    time: f64,
    next_exit: f64,
    iat_distribution: Exp<f64>,
    kind_distribution: Bernoulli,
    service_time: ServiceTime,
    selector: TableSelector,
    rng: StdRng,
    stats: UserStats,
}

impl User {
    pub fn new(
        id: UserId,
        params: UserParams,
        selector: TableSelector,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        let iat_distribution = match Exp::new(params.lambda) {
            Ok(dist) if params.lambda > 0. && params.lambda.is_finite() => dist,
            _ => {
                return Err(ConfigError::InvalidParameter {
                    name: "users.lambda",
                    value: params.lambda.to_string(),
                })
            }
        };
        let kind_distribution = Bernoulli::new(params.read_probability).map_err(|_| {
            ConfigError::InvalidParameter {
                name: "users.read_probability",
                value: params.read_probability.to_string(),
            }
        })?;

        let mut ret = User {
            id,
            time: 0.,
            next_exit: 0.,
            iat_distribution,
            kind_distribution,
            service_time: params.service_time,
            selector,
            rng,
            stats: UserStats::default(),
        };
        ret.draw_next_exit();

        debug!(
            user = id,
            lambda = params.lambda,
            read_probability = params.read_probability,
            tables = ret.selector.get_num_tables(),
            "User initialized"
        );
        Ok(ret)
    }

    pub fn get_id(&self) -> UserId {
        self.id
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn on_response(&mut self, resp: &Response) {
        let wait = resp.wait_time();
        self.stats.responses += 1;
        self.stats.total_wait += wait;
        self.stats.wait_times.push(wait);

        debug!(
            user = self.id,
            table = resp.table,
            kind = %resp.kind,
            time = self.time,
            wait,
            "Response received"
        );
    }

    fn draw_next_exit(&mut self) {
        let delay = self.iat_distribution.sample(&mut self.rng);
        self.stats.access_intervals.push(delay);
        self.next_exit += delay;
    }
}

impl EventSource for User {
    type Exit = (usize, Request);

    fn update_time(&mut self, time: f64) {
        self.time = time;
    }

    fn read_next_exit(&self) -> Option<f64> {
        Some(self.next_exit)
    }

    fn pop_next_exit(&mut self) -> Option<(f64, (usize, Request))> {
        let at = self.next_exit;
        let table = self.selector.sample(&mut self.rng);
        let kind = if self.kind_distribution.sample(&mut self.rng) {
            self.stats.reads += 1;
            AccessKind::Read
        } else {
            self.stats.writes += 1;
            AccessKind::Write
        };
        self.stats.issued += 1;

        debug!(user = self.id, table, kind = %kind, time = at, "Access requested");

        let req = Request::new(kind, Some(self.id), at).with_service_time(self.service_time);
        self.draw_next_exit();
        Some((at, (table, req)))
    }
}
