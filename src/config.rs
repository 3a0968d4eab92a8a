//! TOML profile describing one simulation run.
//!
//! ```toml
//! [simulation]
//! duration = 1000.0
//! seed = 42
//!
//! [tables]
//! count = 10
//!
//! [users]
//! count = 20
//! lambda = 0.5
//! read_probability = 0.8
//! service_time = 1.0
//! table_distribution = "lognormal"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::tables::request::{ServiceTime, DEFAULT_SERVICE_TIME};
use crate::users::selection::{TableSelection, TableSelector};
use crate::users::user::UserParams;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub tables: TablesConfig,
    pub users: UsersConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Simulated time at which every table is shut down
    pub duration: f64,
    /// Master seed; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TablesConfig {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UsersConfig {
    pub count: usize,
    pub lambda: f64,
    pub read_probability: f64,
    #[serde(default = "default_service_time")]
    pub service_time: f64,
    #[serde(default = "default_table_distribution")]
    pub table_distribution: String,
    #[serde(default)]
    pub lognormal_mu: Option<f64>,
    #[serde(default)]
    pub lognormal_sigma: Option<f64>,
    #[serde(default)]
    pub zipf_exponent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// JSON report destination
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_service_time() -> f64 {
    DEFAULT_SERVICE_TIME
}

fn default_table_distribution() -> String {
    "uniform".to_string()
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        value: value.to_string(),
    }
}

impl UsersConfig {
    pub fn selection(&self) -> Result<TableSelection, ConfigError> {
        TableSelection::from_name(
            &self.table_distribution,
            self.lognormal_mu,
            self.lognormal_sigma,
            self.zipf_exponent,
        )
    }

    pub fn params(&self) -> Result<UserParams, ConfigError> {
        let service_time = ServiceTime::new(self.service_time)
            .map_err(|_| invalid("users.service_time", self.service_time))?;
        Ok(UserParams {
            lambda: self.lambda,
            read_probability: self.read_probability,
            service_time,
        })
    }
}

impl FromStr for SimConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl SimConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let duration = self.simulation.duration;
        if !duration.is_finite() || duration <= 0. {
            return Err(invalid("simulation.duration", duration));
        }
        if self.tables.count == 0 {
            return Err(invalid("tables.count", self.tables.count));
        }
        if self.users.count == 0 {
            return Err(invalid("users.count", self.users.count));
        }
        if !self.users.lambda.is_finite() || self.users.lambda <= 0. {
            return Err(invalid("users.lambda", self.users.lambda));
        }
        let p = self.users.read_probability;
        if !(0. ..=1.).contains(&p) {
            return Err(invalid("users.read_probability", p));
        }
        self.users.params()?;

        // Builds the sampler once so bad distribution parameters surface here
        let selection = self.users.selection()?;
        TableSelector::new(selection, self.tables.count)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
        [simulation]
        duration = 100.0
        seed = 42

        [tables]
        count = 4

        [users]
        count = 8
        lambda = 0.5
        read_probability = 0.8
        service_time = 0.2
        table_distribution = "lognormal"
        lognormal_sigma = 0.75

        [output]
        file = "out.json"
    "#;

    #[test]
    fn parses_full_profile() {
        let config: SimConfig = PROFILE.parse().unwrap();
        assert_eq!(config.simulation.duration, 100.);
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.tables.count, 4);
        assert_eq!(config.users.count, 8);
        assert_eq!(config.output.file, Some(PathBuf::from("out.json")));
        assert_eq!(
            config.users.selection().unwrap(),
            TableSelection::Lognormal {
                mu: 0.5,
                sigma: 0.75
            }
        );
        assert_eq!(config.users.params().unwrap().service_time.get(), 0.2);
    }

    #[test]
    fn optional_fields_take_defaults() {
        let config: SimConfig = r#"
            [simulation]
            duration = 10.0

            [tables]
            count = 1

            [users]
            count = 1
            lambda = 1.0
            read_probability = 0.5
        "#
        .parse()
        .unwrap();
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.users.service_time, DEFAULT_SERVICE_TIME);
        assert_eq!(config.users.selection().unwrap(), TableSelection::Uniform);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn unknown_distribution_is_fatal() {
        let text = PROFILE.replace("\"lognormal\"", "\"gamma\"");
        match text.parse::<SimConfig>() {
            Err(ConfigError::UnknownTableDistribution(name)) => assert_eq!(name, "gamma"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            ("read_probability = 0.8", "read_probability = 1.2"),
            ("lambda = 0.5", "lambda = -1.0"),
            ("service_time = 0.2", "service_time = -0.2"),
            ("duration = 100.0", "duration = 0.0"),
            ("count = 4", "count = 0"),
        ];
        for &(from, to) in cases.iter() {
            let text = PROFILE.replace(from, to);
            match text.parse::<SimConfig>() {
                Err(ConfigError::InvalidParameter { .. }) => {}
                other => panic!("{} accepted: {:?}", to, other),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        match "[simulation\nduration = 1".parse::<SimConfig>() {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        match SimConfig::from_file("/nonexistent/profile.toml") {
            Err(ConfigError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/profile.toml"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
