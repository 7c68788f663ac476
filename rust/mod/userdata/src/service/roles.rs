//! Threshold engine: progress snapshot + held roles → roles to apply.
//!
//! Pure functions only. The caller fetches live roles and pushes the result
//! to the platform.

use std::collections::BTreeSet;

use crate::model::{PlayerRecord, Role, RoleCatalog, RoleId};

const REALITY_LEGEND_METABITS: f64 = 100e12;
const REALITY_EXPERT_METABITS: f64 = 1e12;
const REALITY_EXPLORER_METABITS: f64 = 1e9;

const PALEONTOLOGIST_LEGEND_PRESTIGE: i64 = 10;
const PROGRESSIVE_PALEONTOLOGIST_PRESTIGE: i64 = 1;
const PALEONTOLOGIST_RANK: u32 = 26;

const SONIC_SPEEDSTER_SECS: f64 = 120.0;
const SIMULATION_SPEEDSTER_SECS: f64 = 300.0;

/// The progress fields role decisions depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub metabits: f64,
    pub dino_rank: u32,
    pub singularity_speedrun_time: Option<f64>,
    pub all_sharks_obtained: bool,
    pub all_hidden_achievements_obtained: bool,
    pub beta_tester: bool,
}

impl From<&PlayerRecord> for ProgressSnapshot {
    fn from(record: &PlayerRecord) -> Self {
        Self {
            metabits: record.metabits,
            dino_rank: record.dino_rank,
            singularity_speedrun_time: record.singularity_speedrun_time,
            all_sharks_obtained: record.all_sharks_obtained,
            all_hidden_achievements_obtained: record.all_hidden_achievements_obtained,
            beta_tester: record.beta_tester,
        }
    }
}

/// Engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleGrant {
    /// Full role list to set on the member: qualifying roles plus held
    /// preserved roles.
    pub roles: BTreeSet<RoleId>,
    /// Qualifying roles the member did not hold, in evaluation order.
    pub gained: Vec<Role>,
}

impl RoleGrant {
    pub fn labels(&self) -> Vec<&'static str> {
        self.gained.iter().map(|r| r.label()).collect()
    }
}

/// Highest metabit tier reached, if any.
pub fn metabit_tier(metabits: f64) -> Option<Role> {
    if metabits >= REALITY_LEGEND_METABITS {
        Some(Role::RealityLegend)
    } else if metabits >= REALITY_EXPERT_METABITS {
        Some(Role::RealityExpert)
    } else if metabits >= REALITY_EXPLORER_METABITS {
        Some(Role::RealityExplorer)
    } else {
        None
    }
}

/// `floor((rank - 50) / 50)`; rank 0 gives -1.
pub fn dino_prestige(dino_rank: u32) -> i64 {
    (i64::from(dino_rank) - 50).div_euclid(50)
}

/// Paleontology tier. The prestige checks win over the raw rank check.
pub fn paleo_tier(dino_rank: u32) -> Option<Role> {
    let prestige = dino_prestige(dino_rank);
    if prestige == PALEONTOLOGIST_LEGEND_PRESTIGE {
        Some(Role::PaleontologistLegend)
    } else if prestige == PROGRESSIVE_PALEONTOLOGIST_PRESTIGE {
        Some(Role::ProgressivePaleontologist)
    } else if dino_rank >= PALEONTOLOGIST_RANK {
        Some(Role::Paleontologist)
    } else {
        None
    }
}

/// Simulation roles. Hidden achievements grant the whole set outright.
pub fn simulation_roles(snapshot: &ProgressSnapshot) -> Vec<Role> {
    if snapshot.all_hidden_achievements_obtained {
        return vec![
            Role::FinderOfSemblancesSecrets,
            Role::SonicSpeedsterOfSimulations,
            Role::SharkCollector,
        ];
    }

    let mut roles = Vec::new();
    match snapshot.singularity_speedrun_time {
        Some(t) if t <= SONIC_SPEEDSTER_SECS => roles.push(Role::SonicSpeedsterOfSimulations),
        Some(t) if t <= SIMULATION_SPEEDSTER_SECS => roles.push(Role::SimulationSpeedster),
        _ => {}
    }
    if snapshot.all_sharks_obtained {
        roles.push(Role::SharkCollector);
    }
    roles
}

/// Every role the snapshot qualifies for: metabit, paleo, simulation, beta.
pub fn qualifying_roles(snapshot: &ProgressSnapshot) -> Vec<Role> {
    let mut roles = Vec::new();
    roles.extend(metabit_tier(snapshot.metabits));
    roles.extend(paleo_tier(snapshot.dino_rank));
    roles.extend(simulation_roles(snapshot));
    if snapshot.beta_tester {
        roles.push(Role::BetaTester);
    }

    let mut seen = BTreeSet::new();
    roles.retain(|r| seen.insert(*r));
    roles
}

/// Compute the member's role list and the newly gained roles.
pub fn evaluate(
    snapshot: &ProgressSnapshot,
    held: &BTreeSet<RoleId>,
    catalog: &RoleCatalog,
) -> RoleGrant {
    let mut roles: BTreeSet<RoleId> = held
        .iter()
        .filter(|id| catalog.is_preserved(id))
        .cloned()
        .collect();

    let mut gained = Vec::new();
    for role in qualifying_roles(snapshot) {
        let id = catalog.id(role);
        if !held.contains(id) {
            gained.push(role);
        }
        roles.insert(id.clone());
    }

    RoleGrant { roles, gained }
}
