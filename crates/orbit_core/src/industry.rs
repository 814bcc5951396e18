//! Deployed equipment and production jobs: refine/construct/mine, all
//! settle-on-access like transfer arrivals — nothing here runs on a timer,
//! a job's outputs only materialize when something reads it past
//! `completes_at`.

use crate::error::{Result, SimError};
use crate::ids::{CorpId, EquipmentId, ItemId, JobId, LocationId, RecipeId, ResourceId};
use crate::inventory::Inventory;
use crate::parts::PartCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Refinery,
    Constructor,
    Reactor,
    Generator,
    Radiator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedEquipment {
    pub id: EquipmentId,
    pub location_id: LocationId,
    pub owner_corp_id: CorpId,
    pub item_id: ItemId,
    pub category: EquipmentCategory,
    pub status: EquipmentStatus,
    pub deployed_at: f64,
    pub specialization: Option<String>,
    pub construction_rate_kg_per_hr: f64,
    pub concurrency_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Refine,
    Construct,
    Mine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub resource_id: ResourceId,
    pub qty_per_batch_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeOutput {
    pub resource_id: ResourceId,
    pub qty_per_batch_kg: f64,
    pub efficiency: f64,
    pub is_byproduct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub refinery_category: Option<String>,
    pub is_shipyard_recipe: bool,
    pub base_build_time_s: f64,
    pub throughput_multiplier: f64,
    pub inputs: Vec<RecipeInput>,
    pub outputs: Vec<RecipeOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionJob {
    pub id: JobId,
    pub location_id: LocationId,
    pub equipment_id: EquipmentId,
    pub owner_corp_id: CorpId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub started_at: f64,
    pub completes_at: f64,
    pub inputs_snapshot: Vec<RecipeInput>,
    pub outputs_snapshot: Vec<RecipeOutput>,
    pub recipe_id: Option<RecipeId>,
    pub resource_id: Option<ResourceId>,
    pub batch_count: u32,
    pub last_settled_at: f64,
    pub total_mined_kg: f64,
    pub effective_rate_kg_per_hr: f64,
}

/// Dispatches a refine or construct job: validates recipe compatibility,
/// checks and deducts inputs, and marks the equipment active.
pub fn start_production_job(
    equipment: &mut DeployedEquipment,
    recipe: &Recipe,
    batch_count: u32,
    inventory: &mut Inventory,
    job_id: JobId,
    now_s: f64,
) -> Result<ProductionJob> {
    if equipment.status != EquipmentStatus::Idle {
        return Err(SimError::conflict("equipment is not idle"));
    }
    if batch_count == 0 {
        return Err(SimError::validation("batch_count must be positive"));
    }

    let job_type = match equipment.category {
        EquipmentCategory::Refinery => {
            if equipment.specialization.as_deref() != recipe.refinery_category.as_deref() {
                return Err(SimError::validation(
                    "recipe refinery_category does not match equipment specialization",
                ));
            }
            JobType::Refine
        }
        EquipmentCategory::Constructor => {
            if !recipe.is_shipyard_recipe {
                return Err(SimError::validation(
                    "constructors only accept shipyard-type recipes",
                ));
            }
            JobType::Construct
        }
        _ => return Err(SimError::validation("equipment category cannot run production jobs")),
    };

    for input in &recipe.inputs {
        let needed = input.qty_per_batch_kg * f64::from(batch_count);
        if !inventory.has_resource(&equipment.location_id, &equipment.owner_corp_id, &input.resource_id, needed) {
            return Err(SimError::precondition(format!(
                "insufficient {} for job dispatch",
                input.resource_id
            )));
        }
    }
    for input in &recipe.inputs {
        let needed = input.qty_per_batch_kg * f64::from(batch_count);
        inventory.upsert_resource(
            &equipment.location_id,
            &equipment.owner_corp_id,
            &input.resource_id,
            -needed,
            -needed,
            now_s,
        );
    }

    let throughput = if equipment.category == EquipmentCategory::Constructor {
        equipment.construction_rate_kg_per_hr / 50.0
    } else {
        recipe.throughput_multiplier
    };
    let throughput = if throughput > 0.0 { throughput } else { 1.0 };
    let completes_at = now_s + recipe.base_build_time_s * f64::from(batch_count) / throughput;

    let outputs_snapshot: Vec<RecipeOutput> = recipe
        .outputs
        .iter()
        .map(|o| RecipeOutput {
            resource_id: o.resource_id.clone(),
            qty_per_batch_kg: o.qty_per_batch_kg * o.efficiency * f64::from(batch_count),
            efficiency: o.efficiency,
            is_byproduct: o.is_byproduct,
        })
        .collect();

    equipment.status = EquipmentStatus::Active;

    Ok(ProductionJob {
        id: job_id,
        location_id: equipment.location_id.clone(),
        equipment_id: equipment.id.clone(),
        owner_corp_id: equipment.owner_corp_id.clone(),
        job_type,
        status: JobStatus::Active,
        started_at: now_s,
        completes_at,
        inputs_snapshot: recipe
            .inputs
            .iter()
            .map(|i| RecipeInput {
                resource_id: i.resource_id.clone(),
                qty_per_batch_kg: i.qty_per_batch_kg * f64::from(batch_count),
            })
            .collect(),
        outputs_snapshot,
        recipe_id: Some(recipe.id.clone()),
        resource_id: None,
        batch_count,
        last_settled_at: now_s,
        total_mined_kg: 0.0,
        effective_rate_kg_per_hr: 0.0,
    })
}

/// Settles a refine/construct job past its completion time and returns the
/// equipment to idle. No-op if not yet complete.
///
/// Construct jobs restore their outputs as parts via a catalog lookup
/// (`output.resource_id` names an item id in that case); every other job
/// type credits the location inventory as a resource mass, with the
/// output's volume derived from `volume_m3_per_kg_fn` rather than left at
/// zero.
pub fn settle_production_job(
    job: &mut ProductionJob,
    equipment: &mut DeployedEquipment,
    inventory: &mut Inventory,
    parts_catalog: &PartCatalog,
    volume_m3_per_kg_fn: impl Fn(&ResourceId) -> f64,
    now_s: f64,
) {
    if job.status != JobStatus::Active || now_s < job.completes_at {
        return;
    }
    for output in &job.outputs_snapshot {
        if job.job_type == JobType::Construct {
            let part_count = output.qty_per_batch_kg;
            if let Some(part) = parts_catalog.get(output.resource_id.as_str()) {
                inventory.upsert_part(&job.location_id, &job.owner_corp_id, part, part_count, now_s);
            }
        } else {
            let mass = output.qty_per_batch_kg;
            let volume = mass * volume_m3_per_kg_fn(&output.resource_id);
            inventory.upsert_resource(&job.location_id, &job.owner_corp_id, &output.resource_id, mass, volume, now_s);
        }
    }
    job.status = JobStatus::Completed;
    equipment.status = EquipmentStatus::Idle;
}

/// Starts a continuous mining job. Requires the owning corp to have
/// already prospected the surface site (checked by the caller via
/// `org::has_prospected`). `completes_at` is set far in the future; actual
/// output accrues per [`settle_mining_job`] call.
pub fn start_mining_job(
    equipment: &mut DeployedEquipment,
    resource_id: ResourceId,
    base_mining_rate_kg_per_hr: f64,
    mass_fraction: f64,
    job_id: JobId,
    now_s: f64,
) -> Result<ProductionJob> {
    if equipment.status != EquipmentStatus::Idle {
        return Err(SimError::conflict("equipment is not idle"));
    }
    equipment.status = EquipmentStatus::Active;
    const FAR_FUTURE_S: f64 = 1e12;
    Ok(ProductionJob {
        id: job_id,
        location_id: equipment.location_id.clone(),
        equipment_id: equipment.id.clone(),
        owner_corp_id: equipment.owner_corp_id.clone(),
        job_type: JobType::Mine,
        status: JobStatus::Active,
        started_at: now_s,
        completes_at: FAR_FUTURE_S,
        inputs_snapshot: Vec::new(),
        outputs_snapshot: Vec::new(),
        recipe_id: None,
        resource_id: Some(resource_id),
        batch_count: 0,
        last_settled_at: now_s,
        total_mined_kg: 0.0,
        effective_rate_kg_per_hr: base_mining_rate_kg_per_hr * mass_fraction,
    })
}

/// Accrues `(now - last_settled) * effective_rate / 3600` kg to the
/// location inventory and advances `last_settled_at`. Idempotent at the
/// same `now_s` (zero elapsed time accrues nothing).
pub fn settle_mining_job(job: &mut ProductionJob, inventory: &mut Inventory, now_s: f64) {
    if job.status != JobStatus::Active || job.job_type != JobType::Mine {
        return;
    }
    let elapsed_s = (now_s - job.last_settled_at).max(0.0);
    if elapsed_s <= 0.0 {
        return;
    }
    let Some(resource_id) = job.resource_id.clone() else {
        return;
    };
    let mined_kg = elapsed_s * job.effective_rate_kg_per_hr / 3600.0;
    inventory.upsert_resource(&job.location_id, &job.owner_corp_id, &resource_id, mined_kg, 0.0, now_s);
    job.total_mined_kg += mined_kg;
    job.last_settled_at = now_s;
}

/// Cancels an active job, refunding `(1 - progress) * inputs` to
/// inventory and returning the equipment to idle.
pub fn cancel_job(job: &mut ProductionJob, equipment: &mut DeployedEquipment, inventory: &mut Inventory, now_s: f64) -> Result<()> {
    if job.status != JobStatus::Active {
        return Err(SimError::conflict("job is not active"));
    }
    let progress = if job.completes_at > job.started_at {
        ((now_s - job.started_at) / (job.completes_at - job.started_at)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let refund_fraction = 1.0 - progress;
    for input in &job.inputs_snapshot {
        let refund = input.qty_per_batch_kg * refund_fraction;
        inventory.upsert_resource(&job.location_id, &job.owner_corp_id, &input.resource_id, refund, refund, now_s);
    }
    job.status = JobStatus::Cancelled;
    equipment.status = EquipmentStatus::Idle;
    Ok(())
}

#[derive(Debug, Default)]
pub struct ActiveJobsByEquipment {
    counts: HashMap<EquipmentId, u32>,
}

impl ActiveJobsByEquipment {
    #[must_use]
    pub fn active_count(&self, equipment_id: &EquipmentId) -> u32 {
        self.counts.get(equipment_id).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, equipment_id: &EquipmentId) {
        *self.counts.entry(equipment_id.clone()).or_insert(0) += 1;
    }

    pub fn decrement(&mut self, equipment_id: &EquipmentId) {
        if let Some(count) = self.counts.get_mut(equipment_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(equipment_id);
            }
        }
    }
}

/// Undeploy is forbidden while the equipment has active jobs.
pub fn undeploy(
    equipment_id: &EquipmentId,
    active_jobs: &ActiveJobsByEquipment,
) -> Result<()> {
    if active_jobs.active_count(equipment_id) > 0 {
        return Err(SimError::conflict("cannot undeploy equipment with active jobs"));
    }
    Ok(())
}
