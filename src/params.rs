//! The tuning-parameter bundle.

use log::debug;
use serde::Deserialize;

use crate::Error;

/// Every knob of the solver, with the defaults the conflict optimizer was
/// tuned around.
///
/// A parameters file is JSON with any subset of these keys; `instance` is
/// mandatory there. Values from a file override whatever the command line
/// provided.
#[derive(Clone, Debug)]
pub struct Parameters {
    /// Path of the instance file.
    pub instance: String,
    /// Path of a solution file to warm-start from ("" for none).
    pub solution: String,
    /// Path of a side-info file carrying a clique ("" for none).
    pub info: String,
    /// Name of the algorithm to run.
    pub algorithm: String,
    /// Exponent applied to queue counts in the scored move.
    pub power: f64,
    /// Mean of the gaussian noise in the scored move.
    pub noise_mean: f64,
    /// Spread of the gaussian noise in the scored move.
    pub noise_var: f64,
    /// Per-segment displacement cap; 0 means "derive from the instance
    /// size", see [`Parameters::finalize`].
    pub max_queue: u64,
    /// Hard wall-clock budget for the conflict optimizer, in seconds.
    pub max_run_time: u64,
    /// Enable the bounded DFS repair.
    pub dfs: bool,
    /// Enable easy-segment peeling.
    pub easy: bool,
    /// Cycle `power` through a fixed schedule instead of keeping it fixed.
    pub loop_enabled: bool,
    /// Period of the `loop` schedule, in seconds.
    pub loop_time: u64,
    /// Seed for both random streams; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            instance: String::new(),
            solution: String::new(),
            info: String::new(),
            algorithm: "greedy".to_owned(),
            power: 1.2,
            noise_mean: 1.0,
            noise_var: 0.15,
            max_queue: 0,
            max_run_time: 3600,
            dfs: true,
            easy: true,
            loop_enabled: false,
            loop_time: 3600,
            seed: None,
        }
    }
}

/// The on-disk shape: all keys optional.
#[derive(Debug, Default, Deserialize)]
struct Patch {
    instance: Option<String>,
    solution: Option<String>,
    info: Option<String>,
    algorithm: Option<String>,
    power: Option<f64>,
    noise_mean: Option<f64>,
    noise_var: Option<f64>,
    max_queue: Option<u64>,
    max_run_time: Option<u64>,
    dfs: Option<bool>,
    easy: Option<bool>,
    #[serde(rename = "loop")]
    loop_enabled: Option<bool>,
    loop_time: Option<u64>,
    seed: Option<u64>,
}

impl Parameters {
    /// Overlay a parameters file onto `self`.
    ///
    /// `instance` must be present in the file. Turning `loop` on forces the
    /// initial `power` to the first entry of the schedule, whatever the file
    /// says.
    pub fn merge_file(&mut self, path: &std::path::Path) -> Result<(), Error> {
        let text = std::fs::read_to_string(path)?;
        self.merge_json(&text)
    }

    /// Like [`Parameters::merge_file`], from a JSON string.
    pub fn merge_json(&mut self, text: &str) -> Result<(), Error> {
        let patch: Patch = serde_json::from_str(text)?;
        self.instance = patch.instance.ok_or_else(|| {
            Error::Malformed("parameters file is missing the mandatory `instance` key".into())
        })?;
        if let Some(x) = patch.solution {
            self.solution = x;
        }
        if let Some(x) = patch.info {
            self.info = x;
        }
        if let Some(x) = patch.algorithm {
            self.algorithm = x;
        }
        if let Some(x) = patch.power {
            self.power = x;
        }
        if let Some(x) = patch.noise_mean {
            self.noise_mean = x;
        }
        if let Some(x) = patch.noise_var {
            self.noise_var = x;
        }
        if let Some(x) = patch.max_queue {
            self.max_queue = x;
        }
        if let Some(x) = patch.max_run_time {
            self.max_run_time = x;
        }
        if let Some(x) = patch.dfs {
            self.dfs = x;
        }
        if let Some(x) = patch.easy {
            self.easy = x;
        }
        if let Some(x) = patch.loop_enabled {
            self.loop_enabled = x;
            if x {
                self.power = 1.1;
            }
        }
        if let Some(x) = patch.loop_time {
            self.loop_time = x;
        }
        if let Some(x) = patch.seed {
            self.seed = Some(x);
        }
        debug!("parameters: {self:?}");
        Ok(())
    }

    /// The displacement cap derived from the instance size: small instances
    /// may churn much longer than huge ones.
    pub fn auto_max_queue(n: usize) -> u64 {
        let per = 75_000.0 / n as f64;
        (2000.0 * per * per).round() as u64
    }

    /// Resolve the `max_queue` auto default against the instance size.
    pub fn finalize(&mut self, n: usize) {
        if self.max_queue == 0 {
            self.max_queue = Self::auto_max_queue(n);
        }
    }
}
