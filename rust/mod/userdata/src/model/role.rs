use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A platform role id (Discord snowflake, kept as the string the API returns).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every role whose grant is computed from progress data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    RealityExplorer,
    RealityExpert,
    RealityLegend,
    Paleontologist,
    ProgressivePaleontologist,
    PaleontologistLegend,
    SimulationSpeedster,
    SonicSpeedsterOfSimulations,
    FinderOfSemblancesSecrets,
    SharkCollector,
    BetaTester,
}

impl Role {
    pub const ALL: [Role; 11] = [
        Role::RealityExplorer,
        Role::RealityExpert,
        Role::RealityLegend,
        Role::Paleontologist,
        Role::ProgressivePaleontologist,
        Role::PaleontologistLegend,
        Role::SimulationSpeedster,
        Role::SonicSpeedsterOfSimulations,
        Role::FinderOfSemblancesSecrets,
        Role::SharkCollector,
        Role::BetaTester,
    ];

    /// Human-readable name used in player notifications.
    pub fn label(self) -> &'static str {
        match self {
            Role::RealityExplorer => "Reality Explorer",
            Role::RealityExpert => "Reality Expert",
            Role::RealityLegend => "Reality Legend",
            Role::Paleontologist => "Paleontologist",
            Role::ProgressivePaleontologist => "Progressive Paleontologist",
            Role::PaleontologistLegend => "Paleontologist Legend",
            Role::SimulationSpeedster => "Simulation Speedster",
            Role::SonicSpeedsterOfSimulations => "Sonic Speedster of Simulations",
            Role::FinderOfSemblancesSecrets => "Finder of Semblance's Secrets",
            Role::SharkCollector => "Shark Collector",
            Role::BetaTester => "Beta Tester",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("no role id configured for {0:?}")]
    Missing(Role),

    #[error("role id {0} is configured more than once")]
    Duplicate(RoleId),
}

/// Maps every managed [`Role`] to its platform id, plus the preserved ids
/// that are copied through untouched when a member already holds them.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    /// Indexed by `Role as usize`; always holds one id per role.
    managed: Vec<RoleId>,
    preserved: BTreeSet<RoleId>,
}

impl RoleCatalog {
    /// Build a catalog. Every role must be mapped, and no id may be shared
    /// between two managed roles or between a managed and a preserved role.
    pub fn new(
        mut managed: BTreeMap<Role, RoleId>,
        preserved: impl IntoIterator<Item = RoleId>,
    ) -> Result<Self, CatalogError> {
        let mut ids = Vec::with_capacity(Role::ALL.len());
        let mut seen = BTreeSet::new();
        for role in Role::ALL {
            let id = managed.remove(&role).ok_or(CatalogError::Missing(role))?;
            if !seen.insert(id.clone()) {
                return Err(CatalogError::Duplicate(id));
            }
            ids.push(id);
        }

        let mut kept = BTreeSet::new();
        for id in preserved {
            if seen.contains(&id) || !kept.insert(id.clone()) {
                return Err(CatalogError::Duplicate(id));
            }
        }

        Ok(Self {
            managed: ids,
            preserved: kept,
        })
    }

    /// Platform id of a managed role.
    pub fn id(&self, role: Role) -> &RoleId {
        &self.managed[role.index()]
    }

    pub fn is_preserved(&self, id: &RoleId) -> bool {
        self.preserved.contains(id)
    }

    /// Every configured id, managed first.
    pub fn all_ids(&self) -> impl Iterator<Item = &RoleId> {
        self.managed.iter().chain(self.preserved.iter())
    }
}
