use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use serde::{Deserialize, Serialize};

use crate::build::BuildPlan;

/// Wall-clock limits in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub interpreted: u64,
    pub compiled: u64,
    pub build: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            interpreted: 600,
            compiled: 300,
            build: 300,
        }
    }
}

/// Harness configuration. Relative paths resolve against `work_dir`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub work_dir: PathBuf,
    pub out: PathBuf,
    pub interpreter: PathBuf,
    pub script: PathBuf,
    pub compiler: PathBuf,
    pub sources: Vec<PathBuf>,
    pub executable: PathBuf,
    pub build_flags: Vec<String>,
    pub skip_build: bool,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            out: PathBuf::from("performance_results.csv"),
            interpreter: PathBuf::from("python"),
            script: PathBuf::from("python.py"),
            compiler: PathBuf::from("g++"),
            sources: vec![
                PathBuf::from("algorithms.cpp"),
                PathBuf::from("readinputs_and_menu.cpp"),
            ],
            executable: PathBuf::from("pallet_optimizer"),
            build_flags: vec!["-std=c++11".to_string(), "-O2".to_string()],
            skip_build: false,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn from_cli(args: &Args) -> Result<Config> {
        let mut config = match &args.config {
            Some(config_path) => Config::from_file(config_path)?,
            None => Config::default(),
        };
        if let Some(work_dir) = &args.work_dir {
            config.work_dir = work_dir.to_path_buf();
        }
        if let Some(out) = &args.out {
            config.out = out.to_path_buf();
        }
        if let Some(interpreter) = &args.interpreter {
            config.interpreter = interpreter.to_path_buf();
        }
        if let Some(script) = &args.script {
            config.script = script.to_path_buf();
        }
        if let Some(compiler) = &args.compiler {
            config.compiler = compiler.to_path_buf();
        }
        if let Some(sources) = &args.sources {
            config.sources = sources.to_vec();
        }
        if let Some(executable) = &args.executable {
            config.executable = executable.to_path_buf();
        }
        if args.skip_build {
            config.skip_build = true;
        }
        if let Some(timeout) = args.interpreted_timeout {
            config.timeouts.interpreted = timeout;
        }
        if let Some(timeout) = args.compiled_timeout {
            config.timeouts.compiled = timeout;
        }
        if let Some(timeout) = args.build_timeout {
            config.timeouts.build = timeout;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {path:?}"))?;
        serde_json::from_str(&config_str)
            .with_context(|| format!("Invalid config {path:?}"))
    }

    /// Resolve a configured path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.work_dir.join(path)
    }

    /// Resolve a program path; bare names are left for `PATH` lookup.
    pub fn resolve_program(&self, program: &Path) -> PathBuf {
        if program.components().count() > 1 {
            self.resolve(program)
        } else {
            program.to_path_buf()
        }
    }

    pub fn build_plan(&self) -> BuildPlan {
        BuildPlan {
            compiler: self.resolve_program(&self.compiler),
            sources: self.sources.iter().map(|s| self.resolve(s)).collect(),
            executable: self.resolve(&self.executable),
            flags: self.build_flags.clone(),
            timeout: Duration::from_secs(self.timeouts.build),
        }
    }
}

/// Benchmark the interpreted and the compiled pallet solver on every
/// instance of a directory.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Path to a json config
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory containing the P<n>.csv, TP<n>.csv and OptimalSolution_<n>.txt files
    #[arg(short = 'd', long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
    /// Path of the report file
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Interpreter used to run the interpreted solver
    #[arg(long)]
    pub interpreter: Option<PathBuf>,
    /// Script of the interpreted solver
    #[arg(short, long)]
    pub script: Option<PathBuf>,
    /// Compiler for the compiled solver
    #[arg(long)]
    pub compiler: Option<PathBuf>,
    /// Source files of the compiled solver
    #[arg(long, value_delimiter = ' ', num_args = 0..)]
    pub sources: Option<Vec<PathBuf>>,
    /// Path of the compiled solver executable
    #[arg(short, long)]
    pub executable: Option<PathBuf>,
    /// Use the existing executable instead of compiling
    #[arg(long)]
    pub skip_build: bool,
    /// Timeout for the interpreted solver in seconds
    #[arg(long)]
    pub interpreted_timeout: Option<u64>,
    /// Timeout for the compiled solver in seconds
    #[arg(long)]
    pub compiled_timeout: Option<u64>,
    /// Timeout for the build in seconds
    #[arg(long)]
    pub build_timeout: Option<u64>,
    #[command(flatten)]
    pub verbosity: Verbosity,
}
