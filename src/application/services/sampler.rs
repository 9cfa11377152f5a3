//! Sampler service
//!
//! Loads skeletons, keeps a canonical cached copy per file, and runs the
//! interpolate → partition pipeline on private working copies.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, instrument};

use crate::application::skeleton_file::SkeletonFile;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    interpolate_positions, interval_nodes, partition, report, Domain, NodeId, Partition,
    PartitionReport, Skeleton,
};
use crate::infrastructure::traits::FileSystem;

/// Outcome of planning intervals for a domain.
#[derive(Debug, Clone)]
pub struct IntervalPlan {
    /// Working copy including synthesized nodes and interpolated positions
    pub skeleton: Skeleton,
    pub domain: Domain,
    pub partition: Partition,
    pub report: PartitionReport,
    /// Number of nodes moved by section interpolation
    pub interpolated: usize,
}

/// Outcome of section interpolation on a skeleton.
#[derive(Debug, Clone)]
pub struct InterpolationOutcome {
    pub original: Arc<Skeleton>,
    pub interpolated: Skeleton,
    pub moved: usize,
}

impl InterpolationOutcome {
    /// Nodes whose position differs from the original.
    pub fn moved_nodes(&self) -> Vec<NodeId> {
        self.interpolated
            .positions
            .iter()
            .filter(|&(id, p)| self.original.positions.get(id) != Some(p))
            .map(|(&id, _)| id)
            .collect()
    }
}

/// Service for creating sampler intervals on skeletons.
pub struct SamplerService {
    fs: Arc<dyn FileSystem>,
    cache: Mutex<HashMap<PathBuf, Arc<Skeleton>>>,
}

impl SamplerService {
    /// Create a new sampler service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load a skeleton, reusing the cached copy if there is one.
    #[instrument(level = "debug", skip(self))]
    pub fn load_skeleton(&self, path: &Path) -> ApplicationResult<Arc<Skeleton>> {
        if let Some(skeleton) = self.cache_guard().get(path) {
            debug!("load_skeleton: cache hit {}", path.display());
            return Ok(Arc::clone(skeleton));
        }
        let skeleton = Arc::new(self.read_skeleton(path)?);
        self.cache_guard()
            .insert(path.to_path_buf(), Arc::clone(&skeleton));
        Ok(skeleton)
    }

    /// Load a skeleton from disk, replacing any cached copy.
    ///
    /// Used where the arbor is expected to have changed since it was cached.
    pub fn reload_skeleton(&self, path: &Path) -> ApplicationResult<Arc<Skeleton>> {
        self.cache_guard().remove(path);
        self.load_skeleton(path)
    }

    fn cache_guard(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<Skeleton>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_skeleton(&self, path: &Path) -> ApplicationResult<Skeleton> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read skeleton", path)?;
        let file = SkeletonFile::parse(&content).map_err(|e| ApplicationError::InvalidSkeleton {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let skeleton = file
            .into_skeleton()
            .map_err(|e| ApplicationError::InvalidSkeleton {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        info!(
            "loaded skeleton {} with {} nodes",
            path.display(),
            skeleton.arbor.len()
        );
        Ok(skeleton)
    }

    /// Working copy of a skeleton with section interpolation applied.
    #[instrument(level = "debug", skip(self, settings))]
    pub fn interpolate(&self, path: &Path, settings: &Settings) -> ApplicationResult<InterpolationOutcome> {
        let original = self.load_skeleton(path)?;
        let mut interpolated = original.working_copy();
        let moved = interpolate_positions(
            &interpolated.arbor,
            &mut interpolated.positions,
            &settings.interpolation.sections(),
        )?;
        Ok(InterpolationOutcome {
            original,
            interpolated,
            moved,
        })
    }

    /// Partition `domain` (or the whole arbor if None) into intervals.
    ///
    /// The cached skeleton is never modified; interpolation and node
    /// synthesis happen on a working copy returned in the plan.
    #[instrument(level = "debug", skip(self, settings))]
    pub fn plan_intervals(
        &self,
        path: &Path,
        domain: Option<Domain>,
        settings: &Settings,
    ) -> ApplicationResult<IntervalPlan> {
        let InterpolationOutcome {
            interpolated: mut skeleton,
            moved,
            ..
        } = self.interpolate(path, settings)?;

        let domain = match domain {
            Some(domain) => domain,
            None => Domain::covering(&skeleton.arbor)?,
        };
        let options = settings.sampler.partition_options();
        let partition = partition(
            &mut skeleton.arbor,
            &mut skeleton.positions,
            &domain,
            &options,
        )?;
        let report = report(
            &skeleton.arbor,
            &skeleton.positions,
            &partition,
            options.target_length,
            settings.sampler.max_diff(),
        )?;
        info!(
            "{} intervals with a length of {}nm, {} new nodes",
            partition.intervals.len(),
            options.target_length,
            partition.added_nodes.len()
        );

        Ok(IntervalPlan {
            skeleton,
            domain,
            partition,
            report,
            interpolated: moved,
        })
    }

    /// Nodes of interval `start -> end` on the current state of the skeleton.
    #[instrument(level = "debug", skip(self, other_boundaries))]
    pub fn interval_members(
        &self,
        path: &Path,
        start: NodeId,
        end: NodeId,
        other_boundaries: &HashSet<NodeId>,
    ) -> ApplicationResult<BTreeSet<NodeId>> {
        let skeleton = self.reload_skeleton(path)?;
        Ok(interval_nodes(&skeleton.arbor, start, end, other_boundaries)?)
    }
}
