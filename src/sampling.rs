//! Seeded sampling of vehicle attributes.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::Gamma;
use thiserror::Error;

use crate::config::{BreakProfile, GammaParams, WeightedValue};
use crate::sim::types::SimConfig;

/// Lowest initial state of charge a vehicle can arrive with (percent).
pub const MIN_INITIAL_SOC: f32 = 1.0;
/// Highest initial state of charge a vehicle can arrive with (percent).
pub const MAX_INITIAL_SOC: f32 = 95.0;

/// Failure to build a distribution from configured parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
    #[error("invalid gamma parameters: {0}")]
    InvalidGamma(String),
}

/// Draws every stochastic vehicle attribute from one seeded stream.
///
/// Two samplers created with the same seed and asked the same questions
/// in the same order return identical answers.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Hands over the stream, e.g. to keep shuffling after setup.
    pub fn into_rng(self) -> StdRng {
        self.rng
    }

    /// Draws an arrival tick in `[0, total_ticks)`.
    ///
    /// Each tick is weighted by the hourly weight of the hour it falls into,
    /// repeated across the whole horizon.
    pub fn arrival_tick(
        &mut self,
        hourly_weights: &[f32],
        config: &SimConfig,
    ) -> Result<usize, SampleError> {
        if hourly_weights.len() != 24 {
            return Err(SampleError::InvalidWeights(format!(
                "expected 24 hourly weights, got {}",
                hourly_weights.len()
            )));
        }
        let per_tick =
            (0..config.total_ticks()).map(|tick| hourly_weights[config.hour_of_day(tick)]);
        let dist =
            WeightedIndex::new(per_tick).map_err(|e| SampleError::InvalidWeights(e.to_string()))?;
        Ok(dist.sample(&mut self.rng))
    }

    /// Picks a break profile for a vehicle arriving during `hour`.
    pub fn break_profile<'a>(
        &mut self,
        profiles: &'a [BreakProfile],
        hour: usize,
    ) -> Result<&'a BreakProfile, SampleError> {
        let dist = WeightedIndex::new(profiles.iter().map(|p| p.weight_at(hour)))
            .map_err(|e| SampleError::InvalidWeights(e.to_string()))?;
        Ok(&profiles[dist.sample(&mut self.rng)])
    }

    /// Discrete weighted choice among `options`.
    pub fn pick_weighted(&mut self, options: &[WeightedValue]) -> Result<f32, SampleError> {
        let dist = WeightedIndex::new(options.iter().map(|o| o.weight))
            .map_err(|e| SampleError::InvalidWeights(e.to_string()))?;
        Ok(options[dist.sample(&mut self.rng)].value)
    }

    /// Initial state of charge, gamma distributed and clamped into
    /// `[MIN_INITIAL_SOC, MAX_INITIAL_SOC]`.
    pub fn initial_soc(&mut self, params: GammaParams) -> Result<f32, SampleError> {
        let gamma = Gamma::new(params.shape, params.scale)
            .map_err(|e| SampleError::InvalidGamma(e.to_string()))?;
        let soc: f32 = gamma.sample(&mut self.rng);
        Ok(soc.clamp(MIN_INITIAL_SOC, MAX_INITIAL_SOC))
    }

    /// Dwell budget in ticks: uniform minutes within the profile range,
    /// rounded up to whole ticks and never below one.
    pub fn dwell_ticks(&mut self, profile: &BreakProfile, config: &SimConfig) -> usize {
        let lo = profile.dwell_minutes_min;
        let hi = profile.dwell_minutes_max.max(lo);
        let minutes = self.rng.random_range(lo..=hi);
        config.minutes_to_ticks(minutes).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::BreakType;

    fn profile(break_type: BreakType, weight: f32, hourly: Option<Vec<f32>>) -> BreakProfile {
        BreakProfile {
            break_type,
            weight,
            hourly_weights: hourly,
            dwell_minutes_min: 30,
            dwell_minutes_max: 45,
            target_soc: 80.0,
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let cfg = SimConfig::new(10, 24, 0);
        let weights = vec![1.0; 24];
        let mut a = Sampler::new(7);
        let mut b = Sampler::new(7);
        for _ in 0..50 {
            assert_eq!(
                a.arrival_tick(&weights, &cfg).unwrap(),
                b.arrival_tick(&weights, &cfg).unwrap()
            );
        }
    }

    #[test]
    fn arrivals_stay_in_horizon_and_respect_zero_hours() {
        let cfg = SimConfig::new(15, 48, 0);
        let mut weights = vec![0.0; 24];
        weights[6] = 1.0;
        let mut sampler = Sampler::new(1);
        for _ in 0..200 {
            let tick = sampler.arrival_tick(&weights, &cfg).unwrap();
            assert!(tick < cfg.total_ticks());
            assert_eq!(cfg.hour_of_day(tick), 6);
        }
    }

    #[test]
    fn arrival_table_must_have_24_entries() {
        let cfg = SimConfig::new(10, 24, 0);
        let err = Sampler::new(0).arrival_tick(&[1.0; 12], &cfg).unwrap_err();
        assert!(matches!(err, SampleError::InvalidWeights(_)));
    }

    #[test]
    fn all_zero_weights_are_rejected() {
        let options = [WeightedValue {
            value: 100.0,
            weight: 0.0,
        }];
        assert!(Sampler::new(0).pick_weighted(&options).is_err());
    }

    #[test]
    fn pick_weighted_only_returns_listed_values() {
        let options = [
            WeightedValue {
                value: 100.0,
                weight: 1.0,
            },
            WeightedValue {
                value: 200.0,
                weight: 3.0,
            },
        ];
        let mut sampler = Sampler::new(3);
        for _ in 0..100 {
            let v = sampler.pick_weighted(&options).unwrap();
            assert!(v == 100.0 || v == 200.0);
        }
    }

    #[test]
    fn break_profile_follows_hourly_multipliers() {
        let mut night = vec![0.0; 24];
        night[2] = 1.0;
        let profiles = vec![
            profile(BreakType::Short, 1.0, None),
            profile(BreakType::Long, 100.0, Some(night)),
        ];
        let mut sampler = Sampler::new(5);
        for _ in 0..50 {
            let p = sampler.break_profile(&profiles, 14).unwrap();
            assert_eq!(p.break_type, BreakType::Short);
        }
    }

    #[test]
    fn initial_soc_is_clamped() {
        let mut sampler = Sampler::new(11);
        let params = GammaParams {
            shape: 2.0,
            scale: 40.0,
        };
        for _ in 0..500 {
            let soc = sampler.initial_soc(params).unwrap();
            assert!((MIN_INITIAL_SOC..=MAX_INITIAL_SOC).contains(&soc));
        }
    }

    #[test]
    fn invalid_gamma_is_rejected() {
        let err = Sampler::new(0)
            .initial_soc(GammaParams {
                shape: -1.0,
                scale: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, SampleError::InvalidGamma(_)));
    }

    #[test]
    fn dwell_ticks_cover_profile_range() {
        let cfg = SimConfig::new(15, 24, 0);
        let p = profile(BreakType::Short, 1.0, None);
        let mut sampler = Sampler::new(9);
        for _ in 0..100 {
            // 30..=45 minutes at 15 min per tick
            let ticks = sampler.dwell_ticks(&p, &cfg);
            assert!((2..=3).contains(&ticks));
        }
    }
}
