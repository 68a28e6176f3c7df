//! Solution files and the improvement trace.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::coloring::Coloring;
use crate::params::Parameters;
use crate::Error;

/// The provenance block embedded in every solution file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Path of the instance the solution was computed from.
    pub input: String,
    /// Who computed it.
    pub author: String,
    /// When the run started, `YYYYMMDD-HHMMSS` local time.
    pub start_time: String,
    /// The machine that computed it.
    pub host: String,
    /// When this file was written, `YYYYMMDD-HHMMSS` local time.
    pub save_time: String,
    /// Seconds between the two.
    pub elapsed_time: f64,
    /// Reserved.
    pub last_meta: String,
}

/// The solution interchange format of the CG:SHOP 2022 challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionFile {
    /// Always `"Solution_CGSHOP2022"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The instance identifier.
    pub instance: String,
    /// The number of colors used.
    pub num_colors: usize,
    /// Provenance.
    pub meta: Meta,
    /// The color label of each segment, dense in `0..num_colors`.
    pub colors: Vec<usize>,
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_owned())
}

/// Writes solution files for one run.
///
/// The run's start time is recorded at construction; each write stamps its
/// own save time and picks a fresh file name, so successive improvements
/// never clobber each other.
#[derive(Debug, Clone)]
pub struct Writer {
    instance_id: String,
    input: String,
    algorithm: String,
    start_time: String,
}

impl Writer {
    /// A writer for solutions of `instance_id`, computed by `algorithm`.
    pub fn new(instance_id: &str, input: &str, algorithm: &str) -> Self {
        Writer {
            instance_id: instance_id.to_owned(),
            input: input.to_owned(),
            algorithm: algorithm.to_owned(),
            start_time: timestamp(),
        }
    }

    /// Write `coloring` to `<id>.<algorithm>.<timestamp>.sol.json` in the
    /// working directory, returning the path.
    pub fn write(&self, coloring: &Coloring, elapsed: f64) -> Result<PathBuf, Error> {
        let path = PathBuf::from(format!(
            "{}.{}.{}.sol.json",
            self.instance_id,
            self.algorithm,
            timestamp()
        ));
        self.write_to(&path, coloring, elapsed)?;
        info!("-> {}", path.display());
        Ok(path)
    }

    /// Write `coloring` to an explicit path.
    pub fn write_to(&self, path: &Path, coloring: &Coloring, elapsed: f64) -> Result<(), Error> {
        let colors = coloring.labels().ok_or(Error::Incomplete)?;
        let file = SolutionFile {
            kind: "Solution_CGSHOP2022".to_owned(),
            instance: self.instance_id.clone(),
            num_colors: coloring.num_colors(),
            meta: Meta {
                input: self.input.clone(),
                author: "planecolor".to_owned(),
                start_time: self.start_time.clone(),
                host: hostname(),
                save_time: timestamp(),
                elapsed_time: elapsed,
                last_meta: String::new(),
            },
            colors,
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

/// Read the color labels back from a solution file, for warm starts.
pub fn read_labels(path: &Path) -> Result<Vec<usize>, Error> {
    let text = std::fs::read_to_string(path)?;
    let file: SolutionFile = serde_json::from_str(&text)?;
    Ok(file.colors)
}

/// The improvement trace the conflict optimizer leaves under `./graphs/`.
///
/// Each improvement appends an `<elapsed> <colors>` line; the whole file is
/// rewritten every time. The file name encodes the instance and every tuning
/// parameter, so traces from different configurations never mix.
#[derive(Debug)]
pub struct StatsFile {
    path: PathBuf,
    points: Vec<(f64, usize)>,
}

impl StatsFile {
    /// The trace file for `instance_id` under the given parameters.
    pub fn new(params: &Parameters, instance_id: &str) -> Self {
        let mut name = String::from(instance_id);
        if !params.solution.is_empty() {
            name.push_str(&format!("_solution-{}", params.solution));
        }
        name.push_str(&format!(
            "_info-{}",
            if params.info.is_empty() { "1" } else { "0" }
        ));
        if params.loop_enabled {
            name.push_str("_power-loop");
        } else {
            name.push_str(&format!("_power-{:.6}", params.power));
        }
        name.push_str(&format!(
            "_noise_mean-{:.6}_noise_var-{:.6}_max_queue-{}_max_run_time-{}_dfs-{}_easy-{}_loop-{}:{}",
            params.noise_mean,
            params.noise_var,
            params.max_queue,
            params.max_run_time,
            params.dfs as u8,
            params.easy as u8,
            params.loop_enabled as u8,
            params.loop_time,
        ));
        StatsFile {
            path: Path::new("graphs").join(name),
            points: Vec::new(),
        }
    }

    /// Where the trace is written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a data point and rewrite the trace.
    pub fn record(&mut self, elapsed: f64, num_colors: usize) -> Result<(), Error> {
        self.points.push((elapsed, num_colors));
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut text = String::new();
        for (elapsed, colors) in &self.points {
            text.push_str(&format!("{elapsed} {colors}\n"));
        }
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}
