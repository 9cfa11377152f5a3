//! Command dispatch and implementations

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::IntervalPlan;
use crate::application::{ApplicationError, PartitionPayload, SkeletonFile};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Domain, NodeId, Position};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

/// Overrides of the loaded settings given on the command line.
#[derive(Debug, Default)]
struct SamplerOverrides {
    length: Option<f64>,
    error: Option<f64>,
    create_boundaries: bool,
    no_interpolation: bool,
}

impl SamplerOverrides {
    fn apply(&self, settings: &Settings) -> CliResult<Settings> {
        let mut settings = settings.clone();
        if let Some(length) = self.length {
            settings.sampler.interval_length = length;
        }
        if let Some(error) = self.error {
            settings.sampler.interval_error = error;
        }
        if self.create_boundaries {
            settings.sampler.create_interval_boundaries = true;
        }
        if self.no_interpolation {
            settings.interpolation.enabled = false;
        }
        settings.validate()?;
        Ok(settings)
    }
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config_dir.as_deref())?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Partition {
            skeleton,
            start,
            ends,
            length,
            error,
            create_boundaries,
            no_interpolation,
            json,
            output,
        } => {
            let overrides = SamplerOverrides {
                length: *length,
                error: *error,
                create_boundaries: *create_boundaries,
                no_interpolation: *no_interpolation,
            };
            let domain = Domain::new(*start, ends.iter().copied());
            cmd_partition(&container, skeleton, domain, &overrides, *json, output.as_deref())
        }
        Commands::Preview { skeleton, length } => {
            let overrides = SamplerOverrides {
                length: *length,
                ..Default::default()
            };
            cmd_preview(&container, skeleton, &overrides)
        }
        Commands::Members {
            skeleton,
            start,
            end,
            boundaries,
        } => cmd_members(&container, skeleton, *start, *end, boundaries),
        Commands::Interpolate { skeleton, json } => cmd_interpolate(&container, skeleton, *json),
        Commands::Tree { skeleton } => cmd_tree(&container, skeleton),
        Commands::Config { command } => cmd_config(&container, command, cli.config_dir.as_deref()),
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(level = "debug", skip(container, overrides))]
fn cmd_partition(
    container: &ServiceContainer,
    skeleton: &Path,
    domain: Domain,
    overrides: &SamplerOverrides,
    json: bool,
    output_path: Option<&Path>,
) -> CliResult<()> {
    let settings = overrides.apply(&container.settings)?;
    let plan = container
        .sampler
        .plan_intervals(skeleton, Some(domain), &settings)?;
    let payload = PartitionPayload::from(&plan.partition);

    if let Some(path) = output_path {
        let content = payload.to_json().map_err(InfraError::from)?;
        container
            .fs
            .write(path, &content)
            .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
        output::action("Written", &path.display());
    }

    if json {
        output::info(&payload.to_json().map_err(InfraError::from)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

#[instrument(level = "debug", skip(container, overrides))]
fn cmd_preview(
    container: &ServiceContainer,
    skeleton: &Path,
    overrides: &SamplerOverrides,
) -> CliResult<()> {
    let settings = overrides.apply(&container.settings)?;
    let plan = container.sampler.plan_intervals(skeleton, None, &settings)?;
    print_plan(&plan);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_members(
    container: &ServiceContainer,
    skeleton: &Path,
    start: NodeId,
    end: NodeId,
    boundaries: &[NodeId],
) -> CliResult<()> {
    let others: HashSet<NodeId> = boundaries.iter().copied().collect();
    let members = container
        .sampler
        .interval_members(skeleton, start, end, &others)?;
    debug!("interval {} -> {} has {} nodes", start, end, members.len());
    for id in members {
        output::info(&id);
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_interpolate(container: &ServiceContainer, skeleton: &Path, json: bool) -> CliResult<()> {
    let outcome = container.sampler.interpolate(skeleton, &container.settings)?;

    if json {
        let file = SkeletonFile::from_skeleton(&outcome.interpolated).map_err(ApplicationError::from)?;
        output::info(&file.to_json().map_err(InfraError::from)?);
        return Ok(());
    }

    if outcome.moved == 0 {
        output::info("No nodes on interpolatable sections");
        return Ok(());
    }
    output::header(&format!("Interpolated {} nodes", outcome.moved));
    for id in outcome.moved_nodes() {
        let before = outcome.original.positions.get(&id);
        let after = outcome.interpolated.positions.get(&id);
        if let (Some(before), Some(after)) = (before, after) {
            output::detail(&format!(
                "{}: {} -> {}",
                id,
                format_position(before),
                format_position(after)
            ));
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree(container: &ServiceContainer, skeleton: &Path) -> CliResult<()> {
    let skeleton = container.sampler.load_skeleton(skeleton)?;
    output::header(&skeleton.tree_summary());
    output::info(&skeleton.to_tree_string());
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    config_dir: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            print_config_path("Global", global_config_path(), container);
            print_config_path("Local", config_dir.map(local_config_path), container);
        }
    }
    Ok(())
}

fn print_config_path(label: &str, path: Option<PathBuf>, container: &ServiceContainer) {
    match path {
        Some(path) if container.fs.exists(&path) => {
            output::action(label, &path.display());
        }
        Some(path) => {
            output::action(label, &format!("{} (not found)", path.display()));
        }
        None => {
            output::action(label, "(none)");
        }
    }
}

fn print_plan(plan: &IntervalPlan) {
    let report = &plan.report;
    output::header(&format!(
        "{} intervals with a length of {}nm",
        report.intervals.len(),
        report.target_length
    ));
    for entry in &report.intervals {
        let line = format!(
            "{} -> {}: {:.1}nm ({:+.1})",
            entry.interval.start, entry.interval.end, entry.length, entry.deviation
        );
        if entry.exceeds_max_diff {
            output::warning(&format!("{line} exceeds max diff of {:.1}nm", report.max_diff));
        } else {
            output::detail(&line);
        }
    }
    if let Some(mean) = report.mean_length() {
        output::detail(&format!(
            "total {:.1}nm, mean {:.1}nm",
            report.total_length(),
            mean
        ));
    }
    if report.added_nodes > 0 {
        output::success(&format!("{} new boundary nodes", report.added_nodes));
    }
    if plan.interpolated > 0 {
        output::success(&format!("{} nodes interpolated", plan.interpolated));
    }
}

fn format_position(p: &Position) -> String {
    format!("({:.1}, {:.1}, {:.1})", p.x, p.y, p.z)
}
