mod cli;
mod paths;
mod render;

use std::fs;
use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use log::debug;
use log::warn;
use masterdetail_lib::GridBuilder;
use masterdetail_lib::GridEvent;
use masterdetail_lib::MasterDetailGrid;
use masterdetail_lib::coordinator::FetchHandle;
use masterdetail_lib::coordinator::FetchOutcome;
use serde_json::Value;
use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::cli::Cli;
use crate::cli::CliError;

/// Terminal logger at the requested level, plus a debug log file in the cache dir.
fn init_logging(level: LevelFilter) -> Result<(), CliError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    paths::rotate_logs();
    if let Some(path) = paths::log_file() {
        let file = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| File::create(&path));
        match file {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file)),
            Err(e) => eprintln!("Not writing {}: {}", path.display(), e),
        }
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

async fn settle(handle: Option<FetchHandle>, what: &str) {
    let Some(handle) = handle else { return };
    match handle.wait().await {
        FetchOutcome::Failed(failure) => warn!("{} failed: {}", what, failure),
        FetchOutcome::Unconfigured(err) => warn!("{}: {}", what, err),
        outcome => debug!("{}: {:?}", what, outcome),
    }
}

/// Replays the requested interactions as grid events.
async fn run(cli: &Cli, grid: &MasterDetailGrid<Value>) -> Result<(), CliError> {
    let config = grid.config();

    // Only the last of these reaches the network.
    let mut pending = Some(grid.load());
    if let Some(sort) = cli.sort_model()? {
        pending = grid.handle(GridEvent::SortChange(sort)).or(pending);
    }
    let pagination = cli.master_pagination(config.default_page_size);
    pending = grid.handle(GridEvent::PaginationChange(pagination)).or(pending);
    settle(pending, "master").await;

    for row_id in cli.expanded_rows() {
        let mut pending = grid.handle(GridEvent::RowExpandToggle(row_id.clone()));
        if cli.tab != 0 {
            pending = grid
                .handle(GridEvent::TabChange {
                    row_id: row_id.clone(),
                    tab: cli.tab,
                })
                .or(pending);
        }
        let pagination = cli.detail_pagination(config.detail_page_size);
        pending = grid
            .handle(GridEvent::DetailPaginationChange {
                row_id: row_id.clone(),
                pagination,
            })
            .or(pending);
        settle(pending, &format!("detail {}", row_id)).await;
    }

    print!("{}", render::grid(&grid.view(), |id| grid.detail_view(id)));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let result = async {
        let config = cli.grid_config()?;
        let grid = GridBuilder::new(config).project_master_columns().build()?;
        run(&cli, &grid).await
    }
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
