//! Command dispatch
//!
//! Every snapshot command runs the same pipeline through the service container;
//! output goes through `cli::output`.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::instrument;

use crate::application::{ApplicationError, Snapshot, StructureCheck, TreeService, TreeView};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{build_hierarchy, calculate_generations, Size, TreeDisplay};
use crate::infrastructure::ServiceContainer;

pub fn execute(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, run `kinlayout --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            completion(*shell);
            Ok(())
        }
        Commands::Config { command } => config_command(cli, command),
        Commands::Layout {
            snapshot,
            json,
            viewport_width,
        } => layout(&container(cli)?, snapshot, *json, *viewport_width),
        Commands::Validate { snapshot } => validate_snapshot(&container(cli)?, snapshot),
        Commands::Tree { snapshot } => tree(&container(cli)?, snapshot),
        Commands::Generations { snapshot } => generations(&container(cli)?, snapshot),
        Commands::Fit {
            snapshot,
            width,
            height,
        } => fit(&container(cli)?, snapshot, *width, *height),
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(ServiceContainer::new(settings)?)
}

fn load(container: &ServiceContainer, path: &Path) -> CliResult<Snapshot> {
    Ok(container.snapshots.load(path)?)
}

fn to_json<T: serde::Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CliError::Application(ApplicationError::OperationFailed {
            context: "serialize output".to_string(),
            source: Box::new(e),
        })
    })
}

#[instrument(level = "debug", skip(container))]
fn layout(
    container: &ServiceContainer,
    path: &Path,
    json: bool,
    viewport_width: Option<f64>,
) -> CliResult<()> {
    if let Some(w) = viewport_width {
        if !w.is_finite() || w <= 0.0 {
            return Err(CliError::InvalidArgs(format!(
                "--viewport-width must be positive, got {w}"
            )));
        }
    }
    let snapshot = load(container, path)?;
    let view = match viewport_width {
        Some(w) => {
            let service = TreeService::new(&container.settings)?.with_viewport_width(w);
            service.render(&snapshot.members, &snapshot.relationships)?
        }
        None => container
            .trees
            .render(&snapshot.members, &snapshot.relationships)?,
    };

    if json {
        output::info(&to_json(&view)?);
        return Ok(());
    }

    match &view {
        TreeView::Unbuildable { reason } => output::error(reason),
        TreeView::Ready {
            nodes,
            bounds,
            violations,
            generations,
            ..
        } => {
            output::header(&format!(
                "{} nodes, {} generations",
                nodes.len(),
                generations
            ));
            for node in nodes {
                output::detail(&format!(
                    "{:<32} level {:<3} x={:>8.1} y={:>8.1}",
                    node.person.full_name(),
                    node.level,
                    node.x,
                    node.y
                ));
            }
            if let Some(b) = bounds {
                output::info(&format!(
                    "bounds: x={:.1} y={:.1} width={:.1} height={:.1}",
                    b.x, b.y, b.width, b.height
                ));
            }
            for v in violations {
                output::warning(v);
            }
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn validate_snapshot(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let snapshot = load(container, path)?;
    let violations = match container
        .trees
        .check(&snapshot.members, &snapshot.relationships)?
    {
        StructureCheck::Unbuildable { reason } => return Err(CliError::Unbuildable(reason)),
        StructureCheck::Checked { violations } => violations,
    };

    if violations.is_empty() {
        output::success(&format!("{} members, no structural violations", snapshot.members.len()));
        return Ok(());
    }
    for v in &violations {
        output::warning(v);
    }
    Err(CliError::Violations(violations.len()))
}

fn tree(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let snapshot = load(container, path)?;
    let tree = build_hierarchy(&snapshot.members, &snapshot.relationships)
        .map_err(ApplicationError::from)?;
    output::info(&tree.to_tree_string());
    Ok(())
}

fn generations(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    let snapshot = load(container, path)?;
    output::info(&calculate_generations(
        &snapshot.members,
        &snapshot.relationships,
    ));
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn fit(
    container: &ServiceContainer,
    path: &Path,
    width: Option<f64>,
    height: Option<f64>,
) -> CliResult<()> {
    let render = container.settings.render;
    let surface = Size::new(
        width.unwrap_or(render.surface_width),
        height.unwrap_or(render.surface_height),
    );
    if !(surface.width > 0.0 && surface.height > 0.0) {
        return Err(CliError::InvalidArgs(format!(
            "surface must be positive, got {}x{}",
            surface.width, surface.height
        )));
    }

    let snapshot = load(container, path)?;
    let view = container
        .trees
        .render(&snapshot.members, &snapshot.relationships)?;
    if let TreeView::Unbuildable { reason } = &view {
        output::warning(reason);
    }
    let state = container.trees.fit_to_surface(&view, surface);
    output::info(&to_json(&state)?);
    Ok(())
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => {
                return Err(CliError::Usage(
                    "cannot determine config directory".to_string(),
                ))
            }
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn completion(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
}
