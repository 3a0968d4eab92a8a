use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::{LogNormal, Zipf};

use crate::error::ConfigError;

pub const DEFAULT_LOGNORMAL_MU: f64 = 0.5;
pub const DEFAULT_LOGNORMAL_SIGMA: f64 = 1.0;
pub const DEFAULT_ZIPF_EXPONENT: f64 = 1.0;

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum TableSelection {
    Uniform,
    Lognormal { mu: f64, sigma: f64 },
    Zipf { exponent: f64 },
}

impl TableSelection {
    pub fn from_name(
        name: &str,
        mu: Option<f64>,
        sigma: Option<f64>,
        exponent: Option<f64>,
    ) -> Result<Self, ConfigError> {
        match name {
            "uniform" => Ok(TableSelection::Uniform),
            "lognormal" => Ok(TableSelection::Lognormal {
                mu: mu.unwrap_or(DEFAULT_LOGNORMAL_MU),
                sigma: sigma.unwrap_or(DEFAULT_LOGNORMAL_SIGMA),
            }),
            "zipf" => Ok(TableSelection::Zipf {
                exponent: exponent.unwrap_or(DEFAULT_ZIPF_EXPONENT),
            }),
            other => Err(ConfigError::UnknownTableDistribution(other.to_owned())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableSelection::Uniform => "uniform",
            TableSelection::Lognormal { .. } => "lognormal",
            TableSelection::Zipf { .. } => "zipf",
        }
    }
}

enum Sampler {
    Uniform,
    Lognormal(LogNormal<f64>),
    Zipf(Zipf<f64>),
}

/// Draws table indices in `[0, num_tables)` according to a `TableSelection`.
pub struct TableSelector {
    num_tables: usize,
    sampler: Sampler,
}

impl TableSelector {
    pub fn new(selection: TableSelection, num_tables: usize) -> Result<Self, ConfigError> {
        if num_tables == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "tables.count",
                value: num_tables.to_string(),
            });
        }

        let sampler = match selection {
            TableSelection::Uniform => Sampler::Uniform,
            TableSelection::Lognormal { mu, sigma } => {
                if sigma.is_nan() || sigma <= 0. {
                    return Err(ConfigError::InvalidParameter {
                        name: "users.lognormal_sigma",
                        value: sigma.to_string(),
                    });
                }
                let dist = LogNormal::new(mu, sigma).map_err(|_| ConfigError::InvalidParameter {
                    name: "users.lognormal_mu",
                    value: mu.to_string(),
                })?;
                Sampler::Lognormal(dist)
            }
            TableSelection::Zipf { exponent } => {
                let invalid = || ConfigError::InvalidParameter {
                    name: "users.zipf_exponent",
                    value: exponent.to_string(),
                };
                if !exponent.is_finite() || exponent <= 0. {
                    return Err(invalid());
                }
                let dist = Zipf::new(num_tables as u64, exponent).map_err(|_| invalid())?;
                Sampler::Zipf(dist)
            }
        };

        Ok(TableSelector {
            num_tables,
            sampler,
        })
    }

    pub fn get_num_tables(&self) -> usize {
        self.num_tables
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let last = self.num_tables - 1;
        match self.sampler {
            Sampler::Uniform => rng.gen_range(0..self.num_tables),
            Sampler::Lognormal(ref dist) => {
                // Fold the draw onto the table range
                let value = dist.sample(rng) % self.num_tables as f64;
                if value < 0. {
                    0
                } else {
                    (value as usize).min(last)
                }
            }
            // Ranks are 1-based floats in [1, num_tables]
            Sampler::Zipf(ref dist) => (dist.sample(rng) as usize).saturating_sub(1).min(last),
        }
    }
}
