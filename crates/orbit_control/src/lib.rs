//! Control-surface operations: thin, validating wrappers around
//! `orbit_core` that own the mutable world state behind a single lock.
//! Nothing here talks HTTP or SQL — it is the seam an API layer or a CLI
//! calls into, one operation per public method.
//!
//! Every operation settles whatever it touches on access before acting on
//! it (ships via [`orbit_core::transfer::settle_arrivals`], jobs via the
//! `settle_*_job` functions, corporations via [`orbit_core::org::settle`])
//! so callers never need to run a separate "tick" step.

use orbit_core::celestial::CelestialConfig;
use orbit_core::error::{Result, SimError};
use orbit_core::ids::{CorpId, EquipmentId, JobId, LocationId, RecipeId, ResourceId, ShipId, TeamId, TechId};
use orbit_core::industry::{
    self, ActiveJobsByEquipment, DeployedEquipment, EquipmentStatus, JobStatus, JobType,
    ProductionJob, Recipe,
};
use orbit_core::inventory::Inventory;
use orbit_core::org::{self, Corporation, ProspectingRecords, ResearchTeam, ResourceDistribution, TechDef};
use orbit_core::parts::{PartCatalog, PartCategory};
use orbit_core::planner::LambertCache;
use orbit_core::route_matrix::RouteMatrix;
use orbit_core::ship::{self, Ship};
use orbit_core::transfer;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::instrument;

/// Everything the control surface needs to resolve a request: static
/// content (celestial graph, catalogs, recipes, techs) plus mutable game
/// state (ships, corporations, equipment, jobs, inventory, prospecting).
pub struct WorldState {
    pub celestial: CelestialConfig,
    pub route_matrix: RouteMatrix,
    pub lambert_cache: LambertCache,
    pub parts_catalog: PartCatalog,
    pub recipes: HashMap<RecipeId, Recipe>,
    pub techs: HashMap<TechId, TechDef>,
    pub ships: HashMap<ShipId, Ship>,
    pub corporations: HashMap<CorpId, Corporation>,
    pub equipment: HashMap<EquipmentId, DeployedEquipment>,
    pub jobs: HashMap<JobId, ProductionJob>,
    pub active_jobs: ActiveJobsByEquipment,
    pub inventory: Inventory,
    pub prospecting: ProspectingRecords,
}

impl WorldState {
    #[must_use]
    pub fn new(celestial: CelestialConfig) -> Result<Self> {
        let (_, edges) = celestial
            .build_graph()
            .map_err(|e| SimError::config("celestial", e.to_string()))?;
        let route_matrix = RouteMatrix::build(&edges);
        Ok(Self {
            celestial,
            route_matrix,
            lambert_cache: LambertCache::new(),
            parts_catalog: PartCatalog::new(),
            recipes: HashMap::new(),
            techs: HashMap::new(),
            ships: HashMap::new(),
            corporations: HashMap::new(),
            equipment: HashMap::new(),
            jobs: HashMap::new(),
            active_jobs: ActiveJobsByEquipment::default(),
            inventory: Inventory::new(),
            prospecting: ProspectingRecords::new(),
        })
    }

    /// Rebuilds the route matrix if the celestial config's edge set has
    /// drifted since it was last cached — called before any operation that
    /// reads `route_matrix` so a content reload never leaves it stale.
    fn refresh_route_matrix(&mut self) -> Result<()> {
        let (_, edges) = self
            .celestial
            .build_graph()
            .map_err(|e| SimError::config("celestial", e.to_string()))?;
        if self.route_matrix.is_stale_for(&edges) {
            self.route_matrix = RouteMatrix::build(&edges);
            self.lambert_cache.clear();
        }
        Ok(())
    }

    fn ship_mut(&mut self, ship_id: &ShipId) -> Result<&mut Ship> {
        self.ships
            .get_mut(ship_id)
            .ok_or_else(|| SimError::not_found(format!("ship {ship_id}")))
    }

    fn equipment_mut(&mut self, equipment_id: &EquipmentId) -> Result<&mut DeployedEquipment> {
        self.equipment
            .get_mut(equipment_id)
            .ok_or_else(|| SimError::not_found(format!("equipment {equipment_id}")))
    }

    fn job_mut(&mut self, job_id: &JobId) -> Result<&mut ProductionJob> {
        self.jobs
            .get_mut(job_id)
            .ok_or_else(|| SimError::not_found(format!("job {job_id}")))
    }

    fn corp_mut(&mut self, corp_id: &CorpId) -> Result<&mut Corporation> {
        self.corporations
            .get_mut(corp_id)
            .ok_or_else(|| SimError::not_found(format!("corporation {corp_id}")))
    }
}

/// Owns a [`WorldState`] behind a lock so operations compose safely from
/// multiple callers. One `World` per running server.
#[derive(Clone)]
pub struct World {
    state: std::sync::Arc<Mutex<WorldState>>,
}

impl World {
    #[must_use]
    pub fn new(state: WorldState) -> Self {
        Self {
            state: std::sync::Arc::new(Mutex::new(state)),
        }
    }

    /// Runs `f` with exclusive access to the world state. Exposed for
    /// callers (tests, a future CLI) that need read-only snapshots; mutating
    /// operations should go through the typed methods below instead.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut WorldState) -> T) -> T {
        f(&mut self.state.lock())
    }

    // --- ships ---------------------------------------------------------

    #[instrument(skip(self, ship))]
    pub fn spawn_ship(&self, ship: Ship) -> Result<ShipId> {
        let mut state = self.state.lock();
        if state.ships.contains_key(&ship.id) {
            return Err(SimError::conflict(format!("ship {} already exists", ship.id)));
        }
        let id = ship.id.clone();
        state.ships.insert(id.clone(), ship);
        Ok(id)
    }

    /// Settles the ship's arrival status, then dispatches it toward
    /// `to_location_id` through the full guard-rail sequence in
    /// [`orbit_core::transfer::dispatch`].
    #[instrument(skip(self))]
    pub fn transfer_ship(
        &self,
        ship_id: &ShipId,
        to_location_id: &LocationId,
        now_s: f64,
        extra_dv_fraction: f64,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.refresh_route_matrix()?;
        let ship = state.ship_mut(ship_id)?;
        transfer::settle_arrivals(ship, now_s);

        let WorldState {
            ships,
            celestial,
            route_matrix,
            lambert_cache,
            ..
        } = &mut *state;
        let ship = ships
            .get_mut(ship_id)
            .ok_or_else(|| SimError::not_found(format!("ship {ship_id}")))?;
        transfer::dispatch(
            ship,
            celestial,
            route_matrix,
            lambert_cache,
            to_location_id,
            now_s,
            extra_dv_fraction,
        )
    }

    /// Adds fuel up to the ship's derived capacity. Does not touch
    /// inventory — fuel is assumed pre-paid by the caller (a refuel job or
    /// an admin action); a market-priced refuel belongs one layer up.
    #[instrument(skip(self))]
    pub fn refuel_ship(&self, ship_id: &ShipId, amount_kg: f64) -> Result<()> {
        if amount_kg < 0.0 {
            return Err(SimError::validation("refuel amount must be non-negative"));
        }
        let mut state = self.state.lock();
        let ship = state.ship_mut(ship_id)?;
        let stats = ship::derive_stats(&ship.parts, ship.fuel_kg);
        ship.fuel_kg = (ship.fuel_kg + amount_kg).min(stats.fuel_capacity_kg);
        Ok(())
    }

    /// Admin-only: moves a docked ship directly to `to_location_id`,
    /// bypassing every dispatch guard rail. Rejects a ship mid-transit —
    /// settle it first if that's not what's wanted.
    #[instrument(skip(self))]
    pub fn teleport_ship(&self, ship_id: &ShipId, to_location_id: &LocationId, now_s: f64) -> Result<()> {
        let mut state = self.state.lock();
        let ship = state.ship_mut(ship_id)?;
        transfer::settle_arrivals(ship, now_s);
        if ship.location_id.is_none() {
            return Err(SimError::precondition("ship is in transit"));
        }
        ship.location_id = Some(to_location_id.clone());
        ship.motion = None;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_ship(&self, ship_id: &ShipId) -> Result<()> {
        let mut state = self.state.lock();
        state
            .ships
            .remove(ship_id)
            .map(|_| ())
            .ok_or_else(|| SimError::not_found(format!("ship {ship_id}")))
    }

    /// Breaks a docked ship's parts down into its location's inventory
    /// as part stacks, then removes the ship. Rejects a ship mid-transit.
    #[instrument(skip(self))]
    pub fn deconstruct_ship(&self, ship_id: &ShipId, now_s: f64) -> Result<()> {
        let mut state = self.state.lock();
        let ship = state.ship_mut(ship_id)?;
        transfer::settle_arrivals(ship, now_s);
        let location_id = ship
            .location_id
            .clone()
            .ok_or_else(|| SimError::precondition("ship is in transit"))?;
        let owner_corp_id = ship.owner_corp_id.clone();
        let parts = ship.parts.clone();
        for part in &parts {
            state
                .inventory
                .upsert_part(&location_id, &owner_corp_id, part, 1.0, now_s);
        }
        state.ships.remove(ship_id);
        Ok(())
    }

    // --- inventory -------------------------------------------------------

    /// Moves `amount_kg` of a resource from one location's stack to
    /// another for the same owning corp. Rejects if the source stack
    /// doesn't hold enough.
    #[instrument(skip(self))]
    pub fn transfer_resource(
        &self,
        from_location_id: &LocationId,
        to_location_id: &LocationId,
        owner_corp_id: &CorpId,
        resource_id: &ResourceId,
        amount_kg: f64,
        now_s: f64,
    ) -> Result<()> {
        if amount_kg <= 0.0 {
            return Err(SimError::validation("transfer amount must be positive"));
        }
        let mut state = self.state.lock();
        if !state
            .inventory
            .has_resource(from_location_id, owner_corp_id, resource_id, amount_kg)
        {
            return Err(SimError::precondition("insufficient resource at source location"));
        }
        state.inventory.upsert_resource(
            from_location_id,
            owner_corp_id,
            resource_id,
            -amount_kg,
            -amount_kg,
            now_s,
        );
        state.inventory.upsert_resource(
            to_location_id,
            owner_corp_id,
            resource_id,
            amount_kg,
            amount_kg,
            now_s,
        );
        Ok(())
    }

    // --- industry --------------------------------------------------------

    #[instrument(skip(self, equipment))]
    pub fn deploy_equipment(&self, equipment: DeployedEquipment) -> Result<()> {
        let mut state = self.state.lock();
        if state.equipment.contains_key(&equipment.id) {
            return Err(SimError::conflict(format!("equipment {} already deployed", equipment.id)));
        }
        state.equipment.insert(equipment.id.clone(), equipment);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn undeploy_equipment(&self, equipment_id: &EquipmentId) -> Result<()> {
        let mut state = self.state.lock();
        industry::undeploy(equipment_id, &state.active_jobs)?;
        state
            .equipment
            .remove(equipment_id)
            .map(|_| ())
            .ok_or_else(|| SimError::not_found(format!("equipment {equipment_id}")))
    }

    #[instrument(skip(self))]
    pub fn start_job(
        &self,
        equipment_id: &EquipmentId,
        recipe_id: &RecipeId,
        batch_count: u32,
        job_id: JobId,
        now_s: f64,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let recipe = state
            .recipes
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| SimError::not_found(format!("recipe {recipe_id}")))?;
        let equipment = state.equipment_mut(equipment_id)?;
        let mut equipment = equipment.clone();
        let job = industry::start_production_job(
            &mut equipment,
            &recipe,
            batch_count,
            &mut state.inventory,
            job_id.clone(),
            now_s,
        )?;
        state.equipment.insert(equipment_id.clone(), equipment);
        state.active_jobs.increment(equipment_id);
        state.jobs.insert(job_id, job);
        Ok(())
    }

    /// Settles a job up to `now_s` if it has completed, crediting its
    /// output snapshot to the equipment's location inventory (or, for a
    /// construct job, restoring the output as a part via catalog lookup).
    #[instrument(skip(self, volume_m3_per_kg_fn))]
    pub fn settle_job(&self, job_id: &JobId, now_s: f64, volume_m3_per_kg_fn: impl Fn(&ResourceId) -> f64) -> Result<()> {
        let mut state = self.state.lock();
        let job = state
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| SimError::not_found(format!("job {job_id}")))?;
        let was_active = job.status == JobStatus::Active;
        let mut job = job;
        match job.job_type {
            JobType::Mine => {
                industry::settle_mining_job(&mut job, &mut state.inventory, now_s);
            }
            JobType::Refine | JobType::Construct => {
                let mut equipment = state
                    .equipment
                    .get(&job.equipment_id)
                    .cloned()
                    .ok_or_else(|| SimError::not_found(format!("equipment {}", job.equipment_id)))?;
                industry::settle_production_job(
                    &mut job,
                    &mut equipment,
                    &mut state.inventory,
                    &state.parts_catalog,
                    &volume_m3_per_kg_fn,
                    now_s,
                );
                if was_active && job.status == JobStatus::Completed {
                    state.active_jobs.decrement(&job.equipment_id);
                }
                state.equipment.insert(job.equipment_id.clone(), equipment);
            }
        }
        state.jobs.insert(job_id.clone(), job);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn cancel_job(&self, job_id: &JobId, now_s: f64) -> Result<()> {
        let mut state = self.state.lock();
        let mut job = state.job_mut(job_id)?.clone();
        let mut equipment = state
            .equipment
            .get(&job.equipment_id)
            .cloned()
            .ok_or_else(|| SimError::not_found(format!("equipment {}", job.equipment_id)))?;
        industry::cancel_job(&mut job, &mut equipment, &mut state.inventory, now_s)?;
        state.active_jobs.decrement(&job.equipment_id);
        state.equipment.insert(job.equipment_id.clone(), equipment);
        state.jobs.insert(job_id.clone(), job);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn start_mining(
        &self,
        equipment_id: &EquipmentId,
        owner_corp_id: &CorpId,
        resource_id: ResourceId,
        base_rate_kg_per_hr: f64,
        mass_fraction: f64,
        job_id: JobId,
        now_s: f64,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let location_id = state
            .equipment
            .get(equipment_id)
            .map(|e| e.location_id.clone())
            .ok_or_else(|| SimError::not_found(format!("equipment {equipment_id}")))?;
        if !state.prospecting.has_prospected(owner_corp_id, &location_id) {
            return Err(SimError::precondition("site has not been prospected"));
        }
        let mut equipment = state.equipment.get(equipment_id).cloned().unwrap();
        let job = industry::start_mining_job(
            &mut equipment,
            resource_id,
            base_rate_kg_per_hr,
            mass_fraction,
            job_id.clone(),
            now_s,
        )?;
        state.equipment.insert(equipment_id.clone(), equipment);
        state.active_jobs.increment(equipment_id);
        state.jobs.insert(job_id, job);
        Ok(())
    }

    /// Settles accrued output then cancels the mining job (mining jobs
    /// never reach [`JobStatus::Completed`] on their own — only an explicit
    /// stop ends one).
    #[instrument(skip(self))]
    pub fn stop_mining(&self, job_id: &JobId, now_s: f64) -> Result<()> {
        let mut state = self.state.lock();
        let mut job = state.job_mut(job_id)?.clone();
        if job.job_type != JobType::Mine {
            return Err(SimError::validation("job is not a mining job"));
        }
        industry::settle_mining_job(&mut job, &mut state.inventory, now_s);
        let mut equipment = state
            .equipment
            .get(&job.equipment_id)
            .cloned()
            .ok_or_else(|| SimError::not_found(format!("equipment {}", job.equipment_id)))?;
        job.status = JobStatus::Cancelled;
        equipment.status = EquipmentStatus::Idle;
        state.active_jobs.decrement(&job.equipment_id);
        state.equipment.insert(job.equipment_id.clone(), equipment);
        state.jobs.insert(job_id.clone(), job);
        Ok(())
    }

    // --- organization ----------------------------------------------------

    #[instrument(skip(self))]
    pub fn settle_corp(&self, corp_id: &CorpId, now_s: f64) -> Result<()> {
        let mut state = self.state.lock();
        let corp = state.corp_mut(corp_id)?;
        org::settle(corp, now_s);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn unlock_tech(&self, corp_id: &CorpId, tech_id: &TechId) -> Result<()> {
        let mut state = self.state.lock();
        let tech = state
            .techs
            .get(tech_id)
            .cloned()
            .ok_or_else(|| SimError::not_found(format!("tech {tech_id}")))?;
        let corp = state.corp_mut(corp_id)?;
        org::unlock_tech(corp, &tech)
    }

    /// Adds a research team to a corp's roster. Rejects a duplicate team id.
    #[instrument(skip(self, team))]
    pub fn hire_team(&self, corp_id: &CorpId, team: ResearchTeam) -> Result<()> {
        let mut state = self.state.lock();
        let corp = state.corp_mut(corp_id)?;
        if corp.teams.iter().any(|t| t.id == team.id) {
            return Err(SimError::conflict(format!("team {} already hired", team.id)));
        }
        corp.teams.push(team);
        Ok(())
    }

    /// Removes a research team from a corp's roster. Rejects an unknown id.
    #[instrument(skip(self))]
    pub fn fire_team(&self, corp_id: &CorpId, team_id: &TeamId) -> Result<()> {
        let mut state = self.state.lock();
        let corp = state.corp_mut(corp_id)?;
        let before = corp.teams.len();
        corp.teams.retain(|t| &t.id != team_id);
        if corp.teams.len() == before {
            return Err(SimError::not_found(format!("team {team_id}")));
        }
        Ok(())
    }

    /// Spends `qty * cost_per_unit_usd` from the corp's balance and boosts
    /// `qty` units of a catalog item to `to_location_id` as inventory parts
    /// (the LEO-boost ledger named alongside the other corp tables).
    #[instrument(skip(self))]
    pub fn boost_to_leo(
        &self,
        corp_id: &CorpId,
        item_id: &str,
        qty: f64,
        cost_per_unit_usd: f64,
        to_location_id: &LocationId,
        now_s: f64,
    ) -> Result<()> {
        if qty <= 0.0 {
            return Err(SimError::validation("boost quantity must be positive"));
        }
        let mut state = self.state.lock();
        let part = state
            .parts_catalog
            .get(item_id)
            .cloned()
            .ok_or_else(|| SimError::not_found(format!("part {item_id}")))?;
        let cost = qty * cost_per_unit_usd;
        {
            let corp = state.corp_mut(corp_id)?;
            if corp.balance_usd + 1e-9 < cost {
                return Err(SimError::precondition("insufficient balance to boost to LEO"));
            }
            corp.balance_usd -= cost;
        }
        state.inventory.upsert_part(to_location_id, corp_id, &part, qty, now_s);
        Ok(())
    }

    /// Records a prospecting result for `(ship.owner_corp_id, site_id)`,
    /// gating future mining at that site. Requires the ship be docked at
    /// `site_id` and carry a robonaut part ("within range of a surface
    /// site").
    #[instrument(skip(self, distribution))]
    pub fn prospect(
        &self,
        ship_id: &ShipId,
        site_id: &LocationId,
        distribution: ResourceDistribution,
        now_s: f64,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let ship = state.ship_mut(ship_id)?;
        transfer::settle_arrivals(ship, now_s);
        if ship.location_id.as_ref() != Some(site_id) {
            return Err(SimError::precondition("ship is not docked at the prospecting site"));
        }
        if !ship.parts.iter().any(|p| p.category == PartCategory::Robonaut) {
            return Err(SimError::precondition("ship has no robonaut part"));
        }
        let owner_corp_id = ship.owner_corp_id.clone();
        state.prospecting.record(owner_corp_id, site_id.clone(), distribution);
        Ok(())
    }
}
