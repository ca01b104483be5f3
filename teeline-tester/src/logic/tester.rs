use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use teeline_core::WizardConfig;

use super::scenarios::Scenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Non-fatal findings, such as load diagnostics for a stored record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

impl ScenarioResult {
    pub fn from_runs(
        scenario_name: impl Into<String>,
        iterations: usize,
        failures: Vec<String>,
        performance_data: Vec<Duration>,
    ) -> Self {
        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(u32::MAX)
        };
        Self {
            scenario_name: scenario_name.into(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: performance_data.len(),
            failures,
            notes: Vec::new(),
            average_duration,
            performance_data,
        }
    }
}

pub struct LogicTester {
    config: WizardConfig,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(config: WizardConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (seed: {seed})",
                    scenario.key.bright_white()
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let mut rng = ChaCha20Rng::seed_from_u64(iteration_seed);

            match scenario.run(&mut rng, &self.config) {
                Ok(()) => {
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{iterations} passed ({duration:?})",
                            i + 1
                        );
                    }
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (seed {iteration_seed}): {err:#}",
                        i + 1
                    );
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        ScenarioResult::from_runs(
            format!("{} (seed {seed})", scenario.key),
            iterations,
            failures,
            performance_data,
        )
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|value| Duration::from_micros(u64::try_from(value).unwrap_or(0)))
            .collect())
    }
}
