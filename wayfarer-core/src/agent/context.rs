use std::path::Path;
use std::sync::Arc;

use crate::action::{ActionSelector, ActionSpace};
use crate::config::WayfarerConfig;
use crate::error::Result;
use crate::memory::{MemoryStore, NavigationPoint};
use crate::perception::{DistanceBand, Heading, PerceptionIngestor, PerceptionSnapshot, RawSensorBundle};
use crate::reflection::{ReflectionEngine, Tier};

/// Everything one agent carries between cycles.
///
/// Owned by exactly one task; nothing in here is shared with other agents.
/// The snapshot of the current cycle is the only value handed out as an
/// `Arc`, so reflection and selection read the same view.
pub struct AgentContext {
    pub(super) id: String,
    pub(super) config: WayfarerConfig,
    pub(super) memory: MemoryStore,
    pub(super) ingestor: PerceptionIngestor,
    pub(super) junior: ReflectionEngine,
    pub(super) senior: ReflectionEngine,
    pub(super) selector: ActionSelector,
    pub(super) action_space: ActionSpace,
    pub(super) cycle: u64,
    pub(super) last_snapshot: Option<Arc<PerceptionSnapshot>>,
}

impl AgentContext {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &WayfarerConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Direct access for seeding goals or navigation points between cycles.
    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// Number of cycles started so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Action space reported by the latest sensor bundle.
    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn last_snapshot(&self) -> Option<&Arc<PerceptionSnapshot>> {
        self.last_snapshot.as_ref()
    }

    /// Tier the next cycle will reflect with.
    pub fn next_tier(&self) -> Tier {
        Tier::for_cycle(self.cycle + 1, self.config.cycle.senior_every)
    }

    pub(super) fn engine_for(&self, tier: Tier) -> &ReflectionEngine {
        match tier {
            Tier::Junior => &self.junior,
            Tier::Senior => &self.senior,
        }
    }

    /// Save the memory store as a JSON bundle.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.memory.save(path)
    }

    /// Stage navigation points and the action space from a fresh sensor bundle.
    ///
    /// Nothing is written until [`Absorbed::commit`] runs at the
    /// Reflect to Select boundary.
    pub(super) fn absorb(&self, raw: &RawSensorBundle) -> Absorbed {
        let mut points = Vec::new();
        for reported in &raw.navigation_points {
            if reported.name.trim().is_empty() {
                continue;
            }
            let mut point = NavigationPoint::new(&reported.name).with_distance(
                reported
                    .distance
                    .map(|d| DistanceBand::from_distance(d, self.ingestor.config()))
                    .unwrap_or_default(),
            );
            if let Some(heading) = reported.direction.as_deref().and_then(Heading::parse) {
                point = point.with_heading(heading);
            }
            if let Some(note) = &reported.note {
                point = point.with_note(note);
            }
            points.push(point);
        }

        let action_space = (!raw.action_space.is_empty()).then(|| raw.action_space.clone());
        Absorbed { points, action_space }
    }
}

/// Sensor-reported state waiting for the phase boundary.
#[derive(Debug)]
pub(super) struct Absorbed {
    points: Vec<NavigationPoint>,
    action_space: Option<ActionSpace>,
}

impl Absorbed {
    /// Memory as reflection should see it this cycle, when it differs.
    pub(super) fn preview(&self, memory: &MemoryStore) -> Option<MemoryStore> {
        if self.points.is_empty() {
            return None;
        }
        let mut preview = memory.clone();
        for point in &self.points {
            preview.add_navigation_point(point.clone());
        }
        Some(preview)
    }

    pub(super) fn action_space<'a>(&'a self, current: &'a ActionSpace) -> &'a ActionSpace {
        self.action_space.as_ref().unwrap_or(current)
    }

    pub(super) fn commit(self, memory: &mut MemoryStore, action_space: &mut ActionSpace) {
        for point in self.points {
            memory.add_navigation_point(point);
        }
        if let Some(space) = self.action_space {
            *action_space = space;
        }
    }
}

/// Builder for [`AgentContext`].
#[derive(Default)]
pub struct AgentBuilder {
    id: Option<String>,
    config: Option<WayfarerConfig>,
    memory: Option<MemoryStore>,
    action_space: Option<ActionSpace>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the agent id (a v4 UUID when unset)
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn config(mut self, config: WayfarerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Resume from an existing memory store, e.g. one loaded from a bundle
    pub fn memory(mut self, memory: MemoryStore) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Action space used until the environment reports one
    pub fn action_space(mut self, space: ActionSpace) -> Self {
        self.action_space = Some(space);
        self
    }

    pub fn build(self) -> Result<AgentContext> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let memory = self
            .memory
            .unwrap_or_else(|| MemoryStore::new(config.memory.clone()));

        tracing::debug!(agent_id = %id, "Agent context created");

        Ok(AgentContext {
            id,
            memory,
            ingestor: PerceptionIngestor::new(config.perception.clone()),
            junior: ReflectionEngine::junior(),
            senior: ReflectionEngine::senior(),
            selector: ActionSelector::new(config.cycle.failure_cooldown_threshold),
            action_space: self.action_space.unwrap_or_else(ActionSpace::standard),
            cycle: 0,
            last_snapshot: None,
            config,
        })
    }
}
