//! Thin CLI driving the simulation engine for scenario runs and content
//! validation. Owns no state across invocations: `run` loads content and a
//! scenario file, replays the scenario's steps against a fresh [`World`],
//! and prints the resulting ship/job/corp snapshot as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orbit_control::{World, WorldState};
use orbit_core::ids::{CorpId, EquipmentId, JobId, LocationId, RecipeId, ResourceId, ShipId, TeamId, TechId};
use orbit_core::industry::{DeployedEquipment, ProductionJob};
use orbit_core::org::{Corporation, ResearchTeam, ResourceDistribution};
use orbit_core::ship::Ship;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbit_cli", about = "Spaceflight logistics simulation engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a content directory and report whether it validates cleanly.
    Validate {
        #[arg(long)]
        content: PathBuf,
    },
    /// Load content, replay a scenario file's steps, print the resulting
    /// world snapshot as JSON.
    Run {
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        scenario: PathBuf,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ScenarioStep {
    SpawnCorp { corp: Corporation },
    SpawnShip { ship: Ship },
    TransferShip {
        ship_id: ShipId,
        to: LocationId,
        now_s: f64,
        #[serde(default)]
        extra_dv_fraction: f64,
    },
    RefuelShip { ship_id: ShipId, amount_kg: f64 },
    TeleportShip { ship_id: ShipId, to: LocationId, now_s: f64 },
    DeleteShip { ship_id: ShipId },
    DeconstructShip { ship_id: ShipId, now_s: f64 },
    TransferResource {
        from: LocationId,
        to: LocationId,
        owner_corp_id: CorpId,
        resource_id: ResourceId,
        amount_kg: f64,
        now_s: f64,
    },
    DeployEquipment { equipment: DeployedEquipment },
    UndeployEquipment { equipment_id: EquipmentId },
    StartJob {
        equipment_id: EquipmentId,
        recipe_id: RecipeId,
        batch_count: u32,
        job_id: JobId,
        now_s: f64,
    },
    SettleJob { job_id: JobId, now_s: f64 },
    CancelJob { job_id: JobId, now_s: f64 },
    StartMining {
        equipment_id: EquipmentId,
        owner_corp_id: CorpId,
        resource_id: ResourceId,
        base_rate_kg_per_hr: f64,
        mass_fraction: f64,
        job_id: JobId,
        now_s: f64,
    },
    StopMining { job_id: JobId, now_s: f64 },
    SettleCorp { corp_id: CorpId, now_s: f64 },
    UnlockTech { corp_id: CorpId, tech_id: TechId },
    HireTeam { corp_id: CorpId, team: ResearchTeam },
    FireTeam { corp_id: CorpId, team_id: TeamId },
    BoostToLeo {
        corp_id: CorpId,
        item_id: String,
        qty: f64,
        cost_per_unit_usd: f64,
        to_location_id: LocationId,
        now_s: f64,
    },
    Prospect {
        ship_id: ShipId,
        site_id: LocationId,
        distribution: ResourceDistribution,
        now_s: f64,
    },
}

#[derive(Debug, Serialize)]
struct WorldSnapshot {
    ships: Vec<Ship>,
    corporations: Vec<Corporation>,
    equipment: Vec<DeployedEquipment>,
    jobs: Vec<ProductionJob>,
}

fn apply_step(world: &World, step: ScenarioStep) -> Result<()> {
    match step {
        ScenarioStep::SpawnCorp { corp } => {
            world.with_state(|s| {
                s.corporations.insert(corp.id.clone(), corp);
            });
        }
        ScenarioStep::SpawnShip { ship } => {
            world.spawn_ship(ship)?;
        }
        ScenarioStep::TransferShip { ship_id, to, now_s, extra_dv_fraction } => {
            world.transfer_ship(&ship_id, &to, now_s, extra_dv_fraction)?;
        }
        ScenarioStep::RefuelShip { ship_id, amount_kg } => {
            world.refuel_ship(&ship_id, amount_kg)?;
        }
        ScenarioStep::TeleportShip { ship_id, to, now_s } => {
            world.teleport_ship(&ship_id, &to, now_s)?;
        }
        ScenarioStep::DeleteShip { ship_id } => {
            world.delete_ship(&ship_id)?;
        }
        ScenarioStep::DeconstructShip { ship_id, now_s } => {
            world.deconstruct_ship(&ship_id, now_s)?;
        }
        ScenarioStep::TransferResource { from, to, owner_corp_id, resource_id, amount_kg, now_s } => {
            world.transfer_resource(&from, &to, &owner_corp_id, &resource_id, amount_kg, now_s)?;
        }
        ScenarioStep::DeployEquipment { equipment } => {
            world.deploy_equipment(equipment)?;
        }
        ScenarioStep::UndeployEquipment { equipment_id } => {
            world.undeploy_equipment(&equipment_id)?;
        }
        ScenarioStep::StartJob { equipment_id, recipe_id, batch_count, job_id, now_s } => {
            world.start_job(&equipment_id, &recipe_id, batch_count, job_id, now_s)?;
        }
        ScenarioStep::SettleJob { job_id, now_s } => {
            world.settle_job(&job_id, now_s, |_| 0.0)?;
        }
        ScenarioStep::CancelJob { job_id, now_s } => {
            world.cancel_job(&job_id, now_s)?;
        }
        ScenarioStep::StartMining {
            equipment_id,
            owner_corp_id,
            resource_id,
            base_rate_kg_per_hr,
            mass_fraction,
            job_id,
            now_s,
        } => {
            world.start_mining(
                &equipment_id,
                &owner_corp_id,
                resource_id,
                base_rate_kg_per_hr,
                mass_fraction,
                job_id,
                now_s,
            )?;
        }
        ScenarioStep::StopMining { job_id, now_s } => {
            world.stop_mining(&job_id, now_s)?;
        }
        ScenarioStep::SettleCorp { corp_id, now_s } => {
            world.settle_corp(&corp_id, now_s)?;
        }
        ScenarioStep::UnlockTech { corp_id, tech_id } => {
            world.unlock_tech(&corp_id, &tech_id)?;
        }
        ScenarioStep::HireTeam { corp_id, team } => {
            world.hire_team(&corp_id, team)?;
        }
        ScenarioStep::FireTeam { corp_id, team_id } => {
            world.fire_team(&corp_id, &team_id)?;
        }
        ScenarioStep::BoostToLeo { corp_id, item_id, qty, cost_per_unit_usd, to_location_id, now_s } => {
            world.boost_to_leo(&corp_id, &item_id, qty, cost_per_unit_usd, &to_location_id, now_s)?;
        }
        ScenarioStep::Prospect { ship_id, site_id, distribution, now_s } => {
            world.prospect(&ship_id, &site_id, distribution, now_s)?;
        }
    }
    Ok(())
}

fn load_world(content_dir: &Path) -> Result<World> {
    let content = orbit_world::load_content(content_dir)
        .with_context(|| format!("loading content from {}", content_dir.display()))?;
    let mut state = WorldState::new(content.celestial)
        .context("building world state from celestial config")?;
    state.parts_catalog = content.parts_catalog;
    state.recipes = content.recipes;
    state.techs = content.techs;
    Ok(World::new(state))
}

fn run(content_dir: &Path, scenario_path: &Path) -> Result<()> {
    let world = load_world(content_dir)?;

    let scenario_bytes = std::fs::read(scenario_path)
        .with_context(|| format!("reading scenario {}", scenario_path.display()))?;
    let steps: Vec<ScenarioStep> = serde_json::from_slice(&scenario_bytes)
        .with_context(|| format!("parsing scenario {}", scenario_path.display()))?;

    for (index, step) in steps.into_iter().enumerate() {
        apply_step(&world, step).with_context(|| format!("scenario step {index}"))?;
    }

    let snapshot = world.with_state(|s| WorldSnapshot {
        ships: s.ships.values().cloned().collect(),
        corporations: s.corporations.values().cloned().collect(),
        equipment: s.equipment.values().cloned().collect(),
        jobs: s.jobs.values().cloned().collect(),
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn validate(content_dir: &Path) -> Result<()> {
    orbit_world::load_content(content_dir)
        .with_context(|| format!("loading content from {}", content_dir.display()))?;
    println!("content at {} validates cleanly", content_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { content } => validate(&content),
        Command::Run { content, scenario } => run(&content, &scenario),
    }
}
