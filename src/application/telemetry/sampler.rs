//! Random sensor readings with fault injection

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{NormalParams, TelemetryConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Overheat,
    Undervoltage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
    pub fault: Option<Fault>,
}

pub struct TelemetrySampler {
    rng: StdRng,
    voltage: NormalParams,
    current: NormalParams,
    temperature: NormalParams,
    overheat_temperature: NormalParams,
    undervoltage_voltage: NormalParams,
    fault_probability: f64,
}

impl TelemetrySampler {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            voltage: config.voltage,
            current: config.current,
            temperature: config.temperature,
            overheat_temperature: config.overheat_temperature,
            undervoltage_voltage: config.undervoltage_voltage,
            fault_probability: config.fault_probability.clamp(0.0, 1.0),
        }
    }

    /// One reading. A fault replaces a single channel; `current` always
    /// keeps its nominal draw.
    pub fn draw(&mut self) -> Reading {
        let mut reading = Reading {
            voltage: self.normal(self.voltage),
            current: self.normal(self.current),
            temperature: self.normal(self.temperature),
            fault: None,
        };

        if self.rng.gen_bool(self.fault_probability) {
            if self.rng.gen_bool(0.5) {
                reading.temperature = self.normal(self.overheat_temperature);
                reading.fault = Some(Fault::Overheat);
            } else {
                reading.voltage = self.normal(self.undervoltage_voltage);
                reading.fault = Some(Fault::Undervoltage);
            }
        }

        reading
    }

    /// Box-Muller transform
    fn normal(&mut self, params: NormalParams) -> f64 {
        // 1 - [0, 1) keeps ln() away from zero
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        params.mean + params.std_dev * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fault_probability: f64) -> TelemetryConfig {
        TelemetryConfig {
            seed: Some(7),
            fault_probability,
            ..TelemetryConfig::default()
        }
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn nominal_draws_center_on_configured_means() {
        let mut sampler = TelemetrySampler::from_config(&config(0.0));
        let readings: Vec<Reading> = (0..5_000).map(|_| sampler.draw()).collect();

        assert!(readings.iter().all(|r| r.fault.is_none()));
        let v: Vec<f64> = readings.iter().map(|r| r.voltage).collect();
        let c: Vec<f64> = readings.iter().map(|r| r.current).collect();
        let t: Vec<f64> = readings.iter().map(|r| r.temperature).collect();
        assert!((mean(&v) - 220.0).abs() < 0.5);
        assert!((mean(&c) - 32.0).abs() < 0.2);
        assert!((mean(&t) - 40.0).abs() < 0.5);
    }

    #[test]
    fn certain_faults_hit_one_channel() {
        let mut sampler = TelemetrySampler::from_config(&config(1.0));
        let mut overheat = 0;
        let mut undervoltage = 0;
        for _ in 0..1_000 {
            let r = sampler.draw();
            match r.fault {
                Some(Fault::Overheat) => {
                    overheat += 1;
                    assert!(r.temperature > 70.0);
                }
                Some(Fault::Undervoltage) => {
                    undervoltage += 1;
                    assert!(r.voltage < 190.0);
                }
                None => panic!("fault expected"),
            }
        }
        assert!(overheat > 400 && undervoltage > 400);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = TelemetrySampler::from_config(&config(0.05));
        let mut b = TelemetrySampler::from_config(&config(0.05));
        for _ in 0..100 {
            assert_eq!(a.draw(), b.draw());
        }
    }
}
