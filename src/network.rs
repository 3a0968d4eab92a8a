use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::{ConfigError, TransitionError};
use crate::tables::request::Response;
use crate::tables::table::{Table, TableEvent};
use crate::tables::EventSource;
use crate::users::selection::TableSelector;
use crate::users::user::{user_rng, User, UserParams};

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Origin {
    User(usize),
    Table(usize),
}

/// One delivered event. `destination` is `None` when a response could not be routed
/// or a completion no longer matched an in-service request.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Transition {
    pub time: f64,
    pub origin: Origin,
    pub destination: Option<Origin>,
}

#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct RunSummary {
    pub transitions: u64,
    pub end_time: f64,
    pub cancelled_in_service: usize,
    pub discarded_queued: usize,
}

pub struct Network {
    users: Vec<User>,
    tables: Vec<Table>,
    time: f64,
    dropped_responses: u64,
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    pub fn new() -> Network {
        Network {
            users: Vec::new(),
            tables: Vec::new(),
            time: 0.,
            dropped_responses: 0,
        }
    }

    pub fn from_config(config: &SimConfig) -> Result<Network, ConfigError> {
        let selection = config.users.selection()?;
        let params = config.users.params()?;

        let mut qn = Network::new();
        for _ in 0..config.tables.count {
            qn.add_table();
        }
        for id in 0..config.users.count {
            let selector = TableSelector::new(selection, config.tables.count)?;
            qn.add_user(params, selector, user_rng(config.simulation.seed, id))?;
        }

        info!(
            tables = qn.tables.len(),
            users = qn.users.len(),
            distribution = selection.name(),
            "Network initialized"
        );
        Ok(qn)
    }

    pub fn add_table(&mut self) -> usize {
        let id = self.tables.len();
        self.tables.push(Table::new(id));
        id
    }

    pub fn add_user(
        &mut self,
        params: UserParams,
        selector: TableSelector,
        rng: StdRng,
    ) -> Result<usize, ConfigError> {
        if selector.get_num_tables() > self.tables.len() {
            return Err(ConfigError::InvalidParameter {
                name: "tables.count",
                value: self.tables.len().to_string(),
            });
        }
        let id = self.users.len();
        self.users.push(User::new(id, params, selector, rng)?);
        Ok(id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get_time(&self) -> f64 {
        self.time
    }

    pub fn dropped_responses(&self) -> u64 {
        self.dropped_responses
    }

    pub fn is_consistent(&self) -> bool {
        self.tables.iter().all(|t| t.state().is_consistent())
    }

    /// Earliest pending exit; on ties users win over tables, lower index first.
    pub fn read_next_exit(&self) -> Option<(f64, Origin)> {
        let users = self
            .users
            .iter()
            .enumerate()
            .filter_map(|(i, u)| u.read_next_exit().map(|t| (t, Origin::User(i))));
        let tables = self
            .tables
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.read_next_exit().map(|t| (t, Origin::Table(i))));

        let mut next: Option<(f64, Origin)> = None;
        for (t, origin) in users.chain(tables) {
            if next.map_or(true, |(best, _)| t < best) {
                next = Some((t, origin));
            }
        }
        next
    }

    pub fn make_transition(&mut self) -> Result<Transition, TransitionError> {
        let (next_exit, origin) = self.read_next_exit().ok_or(TransitionError::NoExitFound)?;
        self.set_time(next_exit);

        match origin {
            Origin::User(u) => {
                let (t, (table, req)) = self.users[u]
                    .pop_next_exit()
                    .ok_or(TransitionError::NoExitFound)?;
                let dest = self
                    .tables
                    .get_mut(table)
                    .ok_or(TransitionError::UnknownTable(table))?;
                dest.handle_event(TableEvent::Request(req));
                Ok(Transition {
                    time: t,
                    origin,
                    destination: Some(Origin::Table(table)),
                })
            }
            Origin::Table(q) => {
                let (t, token) = self.tables[q]
                    .pop_next_exit()
                    .ok_or(TransitionError::NoExitFound)?;
                let destination = match self.tables[q].handle_event(TableEvent::ServiceCompletion(token)) {
                    Some(resp) => self.route(resp),
                    None => None,
                };
                Ok(Transition {
                    time: t,
                    origin,
                    destination,
                })
            }
        }
    }

    /// Runs every event due at or before `end`, then tears all tables down.
    pub fn run_until(&mut self, end: f64) -> Result<RunSummary, TransitionError> {
        let mut summary = RunSummary::default();

        while let Some((t, _)) = self.read_next_exit() {
            if t > end {
                break;
            }
            self.make_transition()?;
            summary.transitions += 1;
        }

        let end_time = self.time.max(end);
        self.set_time(end_time);
        summary.end_time = end_time;

        for table in self.tables.iter_mut() {
            let report = table.shutdown();
            summary.cancelled_in_service += report.cancelled_in_service;
            summary.discarded_queued += report.discarded_queued;
        }

        info!(
            time = end_time,
            transitions = summary.transitions,
            cancelled = summary.cancelled_in_service,
            discarded = summary.discarded_queued,
            "Simulation finished"
        );
        Ok(summary)
    }

    fn set_time(&mut self, time: f64) {
        self.time = time;
        self.users.iter_mut().for_each(|x| x.update_time(time));
        self.tables.iter_mut().for_each(|x| x.update_time(time));
    }

    fn route(&mut self, resp: Response) -> Option<Origin> {
        match resp.user.and_then(|u| self.users.get_mut(u)) {
            Some(user) => {
                user.on_response(&resp);
                Some(Origin::User(user.get_id()))
            }
            None => {
                debug!(table = resp.table, user = ?resp.user, "Response has no known originator, dropped");
                self.dropped_responses += 1;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::request::{Request, ServiceTime};
    use crate::users::selection::TableSelection;

    fn params(read_probability: f64) -> UserParams {
        UserParams {
            lambda: 1.,
            read_probability,
            service_time: ServiceTime::new(0.5).unwrap(),
        }
    }

    fn network(users: usize, tables: usize, read_probability: f64) -> Network {
        let mut qn = Network::new();
        for _ in 0..tables {
            qn.add_table();
        }
        for id in 0..users {
            let selector = TableSelector::new(TableSelection::Uniform, tables).unwrap();
            qn.add_user(params(read_probability), selector, user_rng(Some(17), id))
                .unwrap();
        }
        qn
    }

    #[test]
    fn empty_network_has_no_exit() {
        let mut qn = Network::new();
        assert_eq!(qn.make_transition(), Err(TransitionError::NoExitFound));
    }

    #[test]
    fn transitions_move_forward_in_time() {
        let mut qn = network(3, 2, 0.5);
        let mut last = 0.;
        for _ in 0..200 {
            let tr = qn.make_transition().unwrap();
            assert!(tr.time >= last);
            assert!(qn.is_consistent());
            match (tr.origin, tr.destination) {
                (Origin::User(_), Some(Origin::Table(t))) => assert!(t < 2),
                (Origin::Table(_), Some(Origin::User(u))) => assert!(u < 3),
                other => panic!("unexpected transition: {:?}", other),
            }
            last = tr.time;
        }
    }

    #[test]
    fn responses_reach_their_users() {
        let mut qn = network(2, 1, 0.3);
        let summary = qn.run_until(50.).unwrap();
        assert_eq!(summary.end_time, 50.);

        let served: u64 = qn.tables().iter().map(|t| t.counters().total_served).sum();
        let answered: u64 = qn.users().iter().map(|u| u.stats().responses).sum();
        let issued: u64 = qn.users().iter().map(|u| u.stats().issued).sum();
        assert_eq!(served, answered);
        assert_eq!(
            issued,
            answered + (summary.cancelled_in_service + summary.discarded_queued) as u64
        );
        assert_eq!(qn.dropped_responses(), 0);
    }

    #[test]
    fn response_without_originator_is_dropped() {
        let mut qn = Network::new();
        qn.add_table();
        qn.tables[0].on_request_arrival(Request::new(
            crate::tables::request::AccessKind::Write,
            None,
            0.,
        ));

        let tr = qn.make_transition().unwrap();
        assert_eq!(tr.origin, Origin::Table(0));
        assert_eq!(tr.destination, None);
        assert_eq!(qn.dropped_responses(), 1);
        assert_eq!(qn.tables()[0].counters().total_served, 1);
    }

    #[test]
    fn user_addressing_missing_tables_is_rejected() {
        let mut qn = Network::new();
        qn.add_table();
        let selector = TableSelector::new(TableSelection::Uniform, 50).unwrap();
        match qn.add_user(params(0.5), selector, user_rng(Some(1), 0)) {
            Err(ConfigError::InvalidParameter { name, value }) => {
                assert_eq!(name, "tables.count");
                assert_eq!(value, "1");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(qn.users().is_empty());
        assert_eq!(qn.read_next_exit().map(|(_, o)| o), None);
    }

    #[test]
    fn request_to_unknown_table_is_an_error() {
        let mut qn = Network::new();
        qn.add_table();
        // Bypass add_user to get a user whose selector outgrows the network
        let selector = TableSelector::new(TableSelection::Uniform, 50).unwrap();
        let user = User::new(0, params(0.5), selector, user_rng(Some(1), 0)).unwrap();
        qn.users.push(user);

        match (0..100).find_map(|_| qn.make_transition().err()) {
            Some(TransitionError::UnknownTable(idx)) => assert!(idx >= 1 && idx < 50),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn run_until_stops_at_end_and_clears_tables() {
        let mut qn = network(4, 2, 0.5);
        qn.run_until(20.).unwrap();
        assert_eq!(qn.get_time(), 20.);
        for table in qn.tables() {
            assert_eq!(table.read_next_exit(), None);
            assert_eq!(table.queue_len(), 0);
        }
    }
}
