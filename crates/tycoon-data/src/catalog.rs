//! The resolved, immutable catalog and the pipeline that builds it.
//!
//! Loading goes data file → [`CatalogData`] → name resolution → [`Catalog`].
//! Every cross-reference (resource names, machine ids, prerequisite ids) is
//! checked here so nothing downstream has to handle a dangling name.

use crate::loader::{
    deserialize_file, deserialize_str, require_data_file, resolve_resource, unknown,
    DataLoadError, DeclaredIds, EntryKind, Format,
};
use crate::schema::{AchievementData, CatalogData, EffectData, MachineData, MetricData, TechData};
use std::collections::BTreeMap;
use std::path::Path;
use tycoon_core::achievement::{AchievementDefinition, AchievementMetric, AchievementTracker};
use tycoon_core::id::{AchievementId, MachineKindId, TechId};
use tycoon_core::machine::{MachineDefinition, MachineRegistry, RateMap};
use tycoon_core::market::Market;
use tycoon_core::resource::ResourceKind;
use tycoon_research::{ResearchEffect, ResearchError, TechDefinition, TechTree};

/// Base name of catalog files inside a data directory.
pub const CATALOG_BASE_NAME: &str = "catalog";

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.ron");
const BUILTIN_ORIGIN: &str = "<builtin>/catalog.ron";

// ===========================================================================
// Catalog
// ===========================================================================

/// Static game content. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub starting_money: f64,
    pub starting_machines: Vec<MachineKindId>,
    machines: Vec<MachineDefinition>,
    market: Vec<(ResourceKind, f64)>,
    tech_tree: TechTree,
    achievements: Vec<AchievementDefinition>,
}

impl Catalog {
    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self, DataLoadError> {
        Self::from_content(BUILTIN_CATALOG, Format::Ron, Path::new(BUILTIN_ORIGIN))
    }

    /// Load `catalog.{ron,json,toml}` from a directory.
    pub fn load_dir(dir: &Path) -> Result<Self, DataLoadError> {
        let path = require_data_file(dir, CATALOG_BASE_NAME)?;
        Self::load_file(&path)
    }

    pub fn load_file(path: &Path) -> Result<Self, DataLoadError> {
        let data: CatalogData = deserialize_file(path)?;
        Self::resolve(data, path)
    }

    pub fn from_content(content: &str, format: Format, origin: &Path) -> Result<Self, DataLoadError> {
        let data: CatalogData = deserialize_str(content, format, origin)?;
        Self::resolve(data, origin)
    }

    /// Resolve every name in `data`. `file` is only used in error messages.
    pub fn resolve(data: CatalogData, file: &Path) -> Result<Self, DataLoadError> {
        if !(data.starting_money.is_finite() && data.starting_money >= 0.0) {
            return Err(invalid(file, "starting_money must be a non-negative number"));
        }

        let mut machine_names = DeclaredIds::new(EntryKind::Machine, file);
        let mut machines = Vec::with_capacity(data.machines.len());
        for machine in &data.machines {
            machine_names.declare(&machine.id)?;
            machines.push(resolve_machine(machine, file)?);
        }

        let mut starting_machines = Vec::new();
        for name in &data.starting_machines {
            machine_names.require(name)?;
            let kind = MachineKindId::new(name.as_str());
            if !starting_machines.contains(&kind) {
                starting_machines.push(kind);
            }
        }

        let mut market = Vec::with_capacity(data.market.len());
        for (name, price) in &data.market {
            market.push(resolve_listing(name, *price, file)?);
        }

        let mut tech_tree = TechTree::new();
        for tech in &data.technologies {
            let def = resolve_tech(tech, &machine_names, file)?;
            tech_tree
                .register(def)
                .map_err(|e| research_error(e, file))?;
        }

        let mut achievement_names = DeclaredIds::new(EntryKind::Achievement, file);
        let mut achievements = Vec::with_capacity(data.achievements.len());
        for achievement in &data.achievements {
            achievement_names.declare(&achievement.id)?;
            achievements.push(resolve_achievement(achievement, tech_tree.len(), file)?);
        }

        tracing::info!(
            origin = %file.display(),
            machines = machines.len(),
            technologies = tech_tree.len(),
            achievements = achievements.len(),
            "catalog loaded"
        );

        Ok(Self {
            starting_money: data.starting_money,
            starting_machines,
            machines,
            market,
            tech_tree,
            achievements,
        })
    }

    // -- Lookups --

    pub fn machine(&self, kind: &MachineKindId) -> Option<&MachineDefinition> {
        self.machines.iter().find(|m| &m.kind == kind)
    }

    pub fn machines(&self) -> &[MachineDefinition] {
        &self.machines
    }

    pub fn tech(&self, id: &TechId) -> Option<&TechDefinition> {
        self.tech_tree.definition(id)
    }

    pub fn tech_count(&self) -> usize {
        self.tech_tree.len()
    }

    pub fn achievement(&self, id: &AchievementId) -> Option<&AchievementDefinition> {
        self.achievements.iter().find(|a| &a.id == id)
    }

    pub fn achievements(&self) -> &[AchievementDefinition] {
        &self.achievements
    }

    /// Base listings, before any research adds resources.
    pub fn market_listings(&self) -> &[(ResourceKind, f64)] {
        &self.market
    }

    // -- Fresh runtime state --

    /// A research tree with every technology unresearched.
    pub fn tech_tree(&self) -> TechTree {
        let mut tree = self.tech_tree.clone();
        tree.reset_all();
        tree
    }

    pub fn achievement_tracker(&self) -> AchievementTracker {
        AchievementTracker::new(self.achievements.clone())
    }

    pub fn market(&self) -> Market {
        Market::new(self.market.iter().copied())
    }

    /// An empty registry with the starting machines unlocked.
    pub fn machine_registry(&self) -> MachineRegistry {
        MachineRegistry::new(self.starting_machines.iter().cloned())
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

fn invalid(file: &Path, detail: impl Into<String>) -> DataLoadError {
    DataLoadError::Invalid {
        file: file.to_path_buf(),
        detail: detail.into(),
    }
}

fn research_error(err: ResearchError, file: &Path) -> DataLoadError {
    match err {
        ResearchError::DuplicateId(id) => DataLoadError::DuplicateEntry {
            file: file.to_path_buf(),
            entry: EntryKind::Technology,
            id: id.to_string(),
        },
        ResearchError::InvalidPrerequisite { prereq, .. } => {
            unknown(EntryKind::Technology, prereq.as_str(), file)
        }
        other => invalid(file, other.to_string()),
    }
}

fn resolve_rates(
    rates: &BTreeMap<String, f64>,
    file: &Path,
) -> Result<RateMap, DataLoadError> {
    let mut out = RateMap::new();
    for (name, rate) in rates {
        let kind = resolve_resource(name, file)?;
        if kind == ResourceKind::Money {
            return Err(invalid(file, "machines cannot consume or produce money"));
        }
        if !(rate.is_finite() && *rate > 0.0) {
            return Err(invalid(file, format!("rate for '{name}' must be positive")));
        }
        out.insert(kind, *rate);
    }
    Ok(out)
}

fn resolve_machine(data: &MachineData, file: &Path) -> Result<MachineDefinition, DataLoadError> {
    if data.outputs.is_empty() {
        return Err(invalid(file, format!("machine '{}' has no outputs", data.id)));
    }
    if !(data.price >= 0.0 && data.upgrade_cost > 0.0 && data.upgrade_multiplier > 0.0) {
        return Err(invalid(
            file,
            format!("machine '{}' has a non-positive price or upgrade cost", data.id),
        ));
    }
    Ok(MachineDefinition {
        kind: MachineKindId::new(data.id.as_str()),
        name: data.name.clone(),
        price: data.price,
        input_rate: resolve_rates(&data.inputs, file)?,
        output_rate: resolve_rates(&data.outputs, file)?,
        base_upgrade_cost: data.upgrade_cost,
        upgrade_cost_multiplier: data.upgrade_multiplier,
    })
}

fn resolve_listing(name: &str, price: f64, file: &Path) -> Result<(ResourceKind, f64), DataLoadError> {
    let kind = resolve_resource(name, file)?;
    if kind == ResourceKind::Money {
        return Err(invalid(file, "money cannot be listed on the market"));
    }
    if !(price.is_finite() && price > 0.0) {
        return Err(invalid(file, format!("market price for '{name}' must be positive")));
    }
    Ok((kind, price))
}

fn resolve_effect(
    effect: &EffectData,
    machines: &DeclaredIds<'_>,
    file: &Path,
) -> Result<ResearchEffect, DataLoadError> {
    Ok(match effect {
        EffectData::UnlockMachine(name) => {
            machines.require(name)?;
            ResearchEffect::UnlockMachine(MachineKindId::new(name.as_str()))
        }
        EffectData::BoostOutput { machine, factor } => {
            if let Some(name) = machine {
                machines.require(name)?;
            }
            ResearchEffect::BoostOutput {
                machine: machine.as_deref().map(MachineKindId::from),
                factor: *factor,
            }
        }
        EffectData::ReduceInput { factor } => ResearchEffect::ReduceInput { factor: *factor },
        EffectData::EnablePassiveIncome { amount } => {
            ResearchEffect::EnablePassiveIncome { amount: *amount }
        }
        EffectData::AddMarketResource {
            resource,
            base_price,
        } => {
            let (resource, base_price) = resolve_listing(resource, *base_price, file)?;
            ResearchEffect::AddMarketResource {
                resource,
                base_price,
            }
        }
    })
}

fn resolve_tech(
    data: &TechData,
    machines: &DeclaredIds<'_>,
    file: &Path,
) -> Result<TechDefinition, DataLoadError> {
    let effects = data
        .effects
        .iter()
        .map(|e| resolve_effect(e, machines, file))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TechDefinition {
        id: TechId::new(data.id.as_str()),
        name: data.name.clone(),
        description: data.description.clone(),
        cost: data.cost,
        cost_per_tick: data.cost_per_tick,
        prerequisites: data
            .prerequisites
            .iter()
            .map(|p| TechId::new(p.as_str()))
            .collect(),
        effects,
    })
}

fn resolve_achievement(
    data: &AchievementData,
    tech_count: usize,
    file: &Path,
) -> Result<AchievementDefinition, DataLoadError> {
    let metric = match &data.metric {
        MetricData::MachinesOwned => AchievementMetric::MachinesOwned,
        MetricData::ResourceProduced(r) => {
            AchievementMetric::ResourceProduced(resolve_resource(r, file)?)
        }
        MetricData::TechsResearched | MetricData::AllTechsResearched => {
            AchievementMetric::TechsResearched
        }
        MetricData::MoneyEarned => AchievementMetric::MoneyEarned,
        MetricData::ResourceOnHand(r) => AchievementMetric::ResourceOnHand(resolve_resource(r, file)?),
        MetricData::MaxMachineLevel => AchievementMetric::MaxMachineLevel,
        MetricData::ProductionRate(r) => AchievementMetric::ProductionRate(resolve_resource(r, file)?),
    };

    let target = match (&data.metric, data.target) {
        (MetricData::AllTechsResearched, _) => tech_count as f64,
        (_, Some(target)) => target,
        (_, None) => {
            return Err(invalid(file, format!("achievement '{}' has no target", data.id)));
        }
    };
    if !(target.is_finite() && target > 0.0) {
        return Err(invalid(
            file,
            format!("achievement '{}' needs a positive target", data.id),
        ));
    }

    Ok(AchievementDefinition {
        id: AchievementId::new(data.id.as_str()),
        name: data.name.clone(),
        description: data.description.clone(),
        metric,
        target,
        hidden: data.hidden,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MINIMAL: &str = r#"(
        starting_money: 50.0,
        starting_machines: ["oreMiner"],
        machines: [
            (id: "oreMiner", name: "Ore Miner", price: 50.0,
             outputs: {"ore": 1.0}, upgrade_cost: 100.0, upgrade_multiplier: 1.5),
        ],
        market: {"ore": 2.0},
    )"#;

    fn parse(content: &str) -> Result<Catalog, DataLoadError> {
        Catalog::from_content(content, Format::Ron, Path::new("test.ron"))
    }

    #[test]
    fn builtin_catalog_resolves() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.machines().len(), 9);
        assert_eq!(catalog.tech_count(), 10);
        assert_eq!(catalog.achievements().len(), 14);
        assert_eq!(catalog.starting_money, 50.0);
        assert_eq!(
            catalog.starting_machines,
            vec![MachineKindId::from("oreMiner"), MachineKindId::from("metalRefiner")]
        );

        let all = catalog.achievement(&AchievementId::from("allResearch")).unwrap();
        assert_eq!(all.target, 10.0);

        let market = catalog.market();
        assert_eq!(market.price(ResourceKind::Device), Some(1000.0));
        assert_eq!(market.price(ResourceKind::QuantumChip), Some(5000.0));
        assert_eq!(market.price(ResourceKind::AiModule), Some(25000.0));
    }

    #[test]
    fn builtin_machine_rates_match_recipes() {
        let catalog = Catalog::builtin().unwrap();
        let device = catalog.machine(&MachineKindId::from("deviceFactory")).unwrap();
        assert_eq!(device.input_rate[&ResourceKind::Plastic], 10.0);
        assert_eq!(device.output_rate[&ResourceKind::Device], 1.0);
        assert_eq!(device.upgrade_cost_multiplier, 1.7);
    }

    #[test]
    fn fresh_tree_is_unresearched() {
        let catalog = Catalog::builtin().unwrap();
        let tree = catalog.tech_tree();
        assert_eq!(tree.researched_count(), 0);
        assert!(tree.is_available(&TechId::from("efficientMining")));
        assert!(!tree.is_available(&TechId::from("advancedMetallurgy")));
    }

    #[test]
    fn minimal_catalog_defaults_optional_sections() {
        let catalog = parse(MINIMAL).unwrap();
        assert_eq!(catalog.tech_count(), 0);
        assert!(catalog.achievements().is_empty());
        assert!(catalog.machine_registry().is_available(&MachineKindId::from("oreMiner")));
    }

    #[test]
    fn unknown_resource_is_unresolved() {
        let bad = MINIMAL.replace(r#"{"ore": 1.0}"#, r#"{"unobtainium": 1.0}"#);
        assert!(matches!(
            parse(&bad),
            Err(DataLoadError::UnknownEntry { entry: EntryKind::Resource, .. })
        ));
    }

    #[test]
    fn unknown_starting_machine_is_unresolved() {
        let bad = MINIMAL.replace(r#"["oreMiner"]"#, r#"["oreMiner", "warpGate"]"#);
        assert!(matches!(
            parse(&bad),
            Err(DataLoadError::UnknownEntry { entry: EntryKind::Machine, .. })
        ));
    }

    #[test]
    fn money_cannot_be_listed() {
        let bad = MINIMAL.replace(r#"{"ore": 2.0}"#, r#"{"money": 2.0}"#);
        assert!(matches!(parse(&bad), Err(DataLoadError::Invalid { .. })));
    }

    #[test]
    fn tech_prerequisites_must_be_declared_first() {
        let bad = MINIMAL.replace(
            "market:",
            r#"technologies: [
                (id: "b", name: "B", cost: 10.0, cost_per_tick: 1.0, prerequisites: ["a"]),
                (id: "a", name: "A", cost: 10.0, cost_per_tick: 1.0),
            ],
            market:"#,
        );
        assert!(matches!(
            parse(&bad),
            Err(DataLoadError::UnknownEntry { entry: EntryKind::Technology, .. })
        ));
    }

    #[test]
    fn achievement_needs_target() {
        let bad = MINIMAL.replace(
            "market:",
            r#"achievements: [
                (id: "x", name: "X", description: "", metric: MoneyEarned),
            ],
            market:"#,
        );
        assert!(matches!(parse(&bad), Err(DataLoadError::Invalid { .. })));
    }

    #[test]
    fn loads_json_and_toml_from_directory() {
        let json = r#"{
            "starting_money": 10.0,
            "starting_machines": ["oreMiner"],
            "machines": [{"id": "oreMiner", "name": "Ore Miner", "price": 5.0,
                          "outputs": {"ore": 1.0}, "upgrade_cost": 10.0, "upgrade_multiplier": 2.0}],
            "technologies": [{"id": "t", "name": "T", "cost": 10.0, "cost_per_tick": 1.0,
                              "effects": [{"BoostOutput": {"machine": "oreMiner", "factor": 2.0}}]}]
        }"#;
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("catalog.json"), json).unwrap();
        let catalog = Catalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.starting_money, 10.0);
        assert_eq!(
            catalog.tech(&TechId::from("t")).unwrap().effects,
            vec![ResearchEffect::BoostOutput {
                machine: Some(MachineKindId::from("oreMiner")),
                factor: 2.0
            }]
        );

        let toml = r#"
starting_money = 10.0
starting_machines = ["oreMiner"]

[[machines]]
id = "oreMiner"
name = "Ore Miner"
price = 5.0
outputs = { ore = 1.0 }
upgrade_cost = 10.0
upgrade_multiplier = 2.0

[[achievements]]
id = "rich"
name = "Rich"
description = "Earn 100"
metric = "MoneyEarned"
target = 100.0
"#;
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("catalog.toml"), toml).unwrap();
        let catalog = Catalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.achievements()[0].metric, AchievementMetric::MoneyEarned);
    }

    #[test]
    fn missing_catalog_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Catalog::load_dir(dir.path()),
            Err(DataLoadError::NotFound { .. })
        ));
    }
}
