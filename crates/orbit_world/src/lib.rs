//! Content loading: parses the celestial topology and item/recipe/tech
//! catalogs from JSON on disk and cross-validates them before the core
//! engine ever sees a request.
//!
//! IO and parse failures surface as [`anyhow::Error`] with file-path
//! context; once the documents are in memory, structural validation
//! failures are [`orbit_core::SimError::Config`] — the point at which the
//! core engine's own error taxonomy takes over.

use anyhow::{Context, Result};
use orbit_core::celestial::CelestialConfig;
use orbit_core::error::{Result as SimResult, SimError};
use orbit_core::ids::{RecipeId, TechId};
use orbit_core::industry::Recipe;
use orbit_core::org::TechDef;
use orbit_core::parts::{Part, PartCatalog};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GameContent {
    pub celestial: CelestialConfig,
    pub parts_catalog: PartCatalog,
    pub recipes: HashMap<RecipeId, Recipe>,
    pub techs: HashMap<TechId, TechDef>,
}

fn read_json<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Loads `celestial.json`, `parts.json`, `recipes.json`, and `techs.json`
/// from `content_dir`, then cross-validates the result. Mirrors the
/// teacher's `load_content` shape: read each file with path context,
/// assemble, validate.
pub fn load_content(content_dir: &Path) -> Result<GameContent> {
    let celestial: CelestialConfig = read_json(&content_dir.join("celestial.json"))?;
    let parts: Vec<Part> = read_json(&content_dir.join("parts.json"))?;
    let recipes: Vec<Recipe> = read_json(&content_dir.join("recipes.json"))?;
    let techs: Vec<TechDef> = read_json(&content_dir.join("techs.json"))?;

    let mut parts_catalog = PartCatalog::new();
    for part in parts {
        parts_catalog.insert(part);
    }
    let recipes: HashMap<RecipeId, Recipe> =
        recipes.into_iter().map(|r| (r.id.clone(), r)).collect();
    let techs: HashMap<TechId, TechDef> = techs.into_iter().map(|t| (t.id.clone(), t)).collect();

    let content = GameContent {
        celestial,
        parts_catalog,
        recipes,
        techs,
    };
    validate_content(&content)?;
    info!(
        bodies = content.celestial.bodies.len(),
        locations = content.celestial.locations.len(),
        recipes = content.recipes.len(),
        techs = content.techs.len(),
        "loaded content from {}",
        content_dir.display(),
    );
    Ok(content)
}

/// Cross-reference checks that JSON-schema validation alone can't catch:
/// the celestial graph builds cleanly, every tech's prerequisites resolve
/// to another known tech, and every recipe's refinery category is
/// non-empty when the recipe isn't a shipyard recipe.
pub fn validate_content(content: &GameContent) -> SimResult<()> {
    debug!(
        recipes = content.recipes.len(),
        techs = content.techs.len(),
        "validating content cross-references"
    );
    content
        .celestial
        .build_graph()
        .map_err(|e| SimError::config("celestial", e.to_string()))?;

    for tech in content.techs.values() {
        for prereq in &tech.prerequisites {
            if !content.techs.contains_key(prereq) {
                return Err(SimError::config(
                    format!("techs/{}/prerequisites", tech.id),
                    format!("unknown prerequisite tech '{prereq}'"),
                ));
            }
        }
    }

    for recipe in content.recipes.values() {
        if !recipe.is_shipyard_recipe && recipe.refinery_category.is_none() {
            return Err(SimError::config(
                format!("recipes/{}/refinery_category", recipe.id),
                "non-shipyard recipes must declare a refinery_category",
            ));
        }
        if recipe.inputs.is_empty() {
            return Err(SimError::config(
                format!("recipes/{}/inputs", recipe.id),
                "recipe must declare at least one input",
            ));
        }
        if recipe.outputs.is_empty() {
            return Err(SimError::config(
                format!("recipes/{}/outputs", recipe.id),
                "recipe must declare at least one output",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::ids::ResourceId;
    use orbit_core::industry::{RecipeInput, RecipeOutput};
    use std::io::Write;

    fn minimal_techs() -> Vec<TechDef> {
        vec![TechDef {
            id: TechId::from("basic_smelting"),
            cost_research_points: 10.0,
            prerequisites: vec![],
        }]
    }

    fn minimal_recipe() -> Recipe {
        Recipe {
            id: RecipeId::from("smelt_ore"),
            refinery_category: Some("smelter".to_string()),
            is_shipyard_recipe: false,
            base_build_time_s: 3600.0,
            throughput_multiplier: 1.0,
            inputs: vec![RecipeInput {
                resource_id: ResourceId::from("ore"),
                qty_per_batch_kg: 100.0,
            }],
            outputs: vec![RecipeOutput {
                resource_id: ResourceId::from("slag"),
                qty_per_batch_kg: 80.0,
                efficiency: 1.0,
                is_byproduct: false,
            }],
        }
    }

    fn content_with(techs: Vec<TechDef>, recipes: Vec<Recipe>) -> GameContent {
        GameContent {
            celestial: orbit_core::test_fixtures::base_celestial_config(),
            parts_catalog: PartCatalog::new(),
            recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            techs: techs.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    #[test]
    fn valid_content_passes_validation() {
        let content = content_with(minimal_techs(), vec![minimal_recipe()]);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn unknown_tech_prerequisite_is_rejected() {
        let mut techs = minimal_techs();
        techs.push(TechDef {
            id: TechId::from("advanced_smelting"),
            cost_research_points: 50.0,
            prerequisites: vec![TechId::from("does_not_exist")],
        });
        let content = content_with(techs, vec![]);
        let err = validate_content(&content).unwrap_err();
        assert!(matches!(err, SimError::Config { .. }));
    }

    #[test]
    fn non_shipyard_recipe_without_refinery_category_is_rejected() {
        let mut recipe = minimal_recipe();
        recipe.refinery_category = None;
        let content = content_with(vec![], vec![recipe]);
        let err = validate_content(&content).unwrap_err();
        assert!(matches!(err, SimError::Config { .. }));
    }

    #[test]
    fn load_content_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("celestial.json"),
            serde_json::to_vec(&orbit_core::test_fixtures::base_celestial_config()).unwrap(),
        )
        .unwrap();
        let mut parts_file = std::fs::File::create(dir.path().join("parts.json")).unwrap();
        parts_file.write_all(b"[]").unwrap();
        std::fs::write(
            dir.path().join("recipes.json"),
            serde_json::to_vec(&vec![minimal_recipe()]).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("techs.json"),
            serde_json::to_vec(&minimal_techs()).unwrap(),
        )
        .unwrap();

        let content = load_content(dir.path()).expect("content should load");
        assert_eq!(content.recipes.len(), 1);
        assert_eq!(content.techs.len(), 1);
    }

    #[test]
    fn load_content_reports_missing_file_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_content(dir.path()).unwrap_err();
        assert!(err.to_string().contains("celestial.json") || format!("{err:#}").contains("celestial.json"));
    }
}
