//! Dataset location configuration

use std::path::PathBuf;

use directories::BaseDirs;

use crate::types::{Result, TelcoError};

/// Environment variable naming the dataset file or directory
pub const DATA_ENV_VAR: &str = "TELCOASK_DATA";

/// File names searched for when no location is configured, workbook first
pub const DEFAULT_DATASET_NAMES: [&str; 2] = [
    "Analisis_Ventas_TELCO_Demo.xlsx",
    "Analisis_Ventas_TELCO_Demo.csv",
];

/// Where to look for the billing dataset
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `--data` flag; must exist when given
    pub data_path: Option<PathBuf>,
    /// `TELCOASK_DATA`; first search candidate when set
    pub env_path: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub home_dir: Option<PathBuf>,
}

impl Config {
    /// Build from the CLI flag, the environment and the user's directories
    pub fn load(data_path: Option<PathBuf>) -> Self {
        let env_path = std::env::var(DATA_ENV_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            data_path,
            env_path,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            home_dir: BaseDirs::new().map(|d| d.home_dir().to_path_buf()),
        }
    }

    /// Search candidates in priority order (the `--data` flag is not a candidate)
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(env_path) = &self.env_path {
            candidates.push(env_path.clone());
        }

        let mut dirs = vec![self.working_dir.clone(), self.working_dir.join("data")];
        if let Some(home) = &self.home_dir {
            dirs.push(home.join(".telcoask"));
        }
        for dir in dirs {
            candidates.extend(DEFAULT_DATASET_NAMES.iter().map(|name| dir.join(name)));
        }
        candidates
    }

    /// Resolve the dataset path: the `--data` flag, else the first existing candidate
    pub fn resolve_dataset(&self) -> Result<PathBuf> {
        if let Some(path) = &self.data_path {
            return if path.exists() {
                Ok(path.clone())
            } else {
                Err(TelcoError::Config(format!(
                    "dataset not found: {}",
                    path.display()
                )))
            };
        }

        let candidates = self.candidates();
        candidates
            .iter()
            .find(|c| c.exists())
            .cloned()
            .ok_or_else(|| {
                TelcoError::Config(format!(
                    "dataset not found. Tried:\n- {}\nSet {} or pass --data <PATH>",
                    join_paths(&candidates),
                    DATA_ENV_VAR
                ))
            })
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n- ")
}
