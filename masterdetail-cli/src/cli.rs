//! Command-line arguments and configuration loading.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use log::info;
use masterdetail_lib::GridConfig;
use masterdetail_lib::model::ExpandIconPosition;
use masterdetail_lib::model::RowId;
use masterdetail_lib::query::Direction;
use masterdetail_lib::query::PaginationModel;
use masterdetail_lib::query::SortModel;

use crate::paths;

/// Errors raised before the grid starts.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid sort '{0}', expected field[:asc|desc]")]
    Sort(String),

    #[error("Failed to initialize logging: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error(transparent)]
    Grid(#[from] masterdetail_lib::error::Error),
}

/// Browse a paginated REST resource and its related records
#[derive(Debug, Parser)]
#[command(name = "masterdetail", version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config dir)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Master endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Master page, 1-based
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,

    /// Master page size
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Master ordering, e.g. `name` or `email:desc`
    #[arg(long)]
    pub sort: Option<String>,

    /// Expand a master row (repeatable)
    #[arg(long = "expand", short = 'x')]
    pub expand: Vec<String>,

    /// Detail tab shown for expanded rows, 0-based
    #[arg(long, default_value_t = 0)]
    pub tab: usize,

    /// Detail page, 1-based
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub detail_page: u64,

    /// Place the expand column: start, end or none
    #[arg(long, value_parser = parse_position)]
    pub expand_column: Option<ExpandIconPosition>,

    /// Terminal log level
    #[arg(long, default_value_t = LevelFilter::Warn)]
    pub log_level: LevelFilter,
}

fn parse_position(value: &str) -> Result<ExpandIconPosition, String> {
    match value.to_ascii_lowercase().as_str() {
        "start" => Ok(ExpandIconPosition::Start),
        "end" => Ok(ExpandIconPosition::End),
        "none" => Ok(ExpandIconPosition::None),
        other => Err(format!("unknown position '{}'", other)),
    }
}

/// Parses `field[:asc|desc]`.
pub fn parse_sort(value: &str) -> Result<SortModel, CliError> {
    let (field, direction) = match value.split_once(':') {
        Some((field, direction)) => {
            let direction = Direction::parse(direction).ok_or_else(|| CliError::Sort(value.to_string()))?;
            (field, direction)
        }
        None => (value, Direction::Asc),
    };
    if field.trim().is_empty() {
        return Err(CliError::Sort(value.to_string()));
    }
    Ok(match direction {
        Direction::Asc => SortModel::asc(field.trim()),
        Direction::Desc => SortModel::desc(field.trim()),
    })
}

impl Cli {
    /// Loads the config file, if any, and applies flag overrides.
    pub fn grid_config(&self) -> Result<GridConfig, CliError> {
        let mut config = match self.config_path() {
            Some(path) => load_config(&path)?,
            None => GridConfig::default(),
        };

        if let Some(url) = &self.base_url {
            config.api_base_url = url.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.master_endpoint = endpoint.clone();
        }
        if let Some(size) = self.page_size {
            config.default_page_size = size;
        }
        if let Some(position) = self.expand_column {
            config.expand_icon_position = position;
        }
        Ok(config)
    }

    /// Explicit `--config`, else the default file when it exists.
    fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => paths::config_file().filter(|path| path.exists()),
        }
    }

    pub fn sort_model(&self) -> Result<Option<SortModel>, CliError> {
        self.sort.as_deref().map(parse_sort).transpose()
    }

    pub fn master_pagination(&self, page_size: usize) -> PaginationModel {
        PaginationModel::new(to_index(self.page), page_size)
    }

    pub fn detail_pagination(&self, page_size: usize) -> PaginationModel {
        PaginationModel::new(to_index(self.detail_page), page_size)
    }

    pub fn expanded_rows(&self) -> Vec<RowId> {
        self.expand.iter().map(|id| RowId::new(id.trim())).collect()
    }
}

fn to_index(page: u64) -> usize {
    usize::try_from(page.saturating_sub(1)).unwrap_or(usize::MAX)
}

fn load_config(path: &Path) -> Result<GridConfig, CliError> {
    info!("Loading config from {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| CliError::Toml {
        path: path.to_path_buf(),
        source,
    })
}
