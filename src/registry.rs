//! Dataset registry - which tables back each designation and how their
//! rows are normalized.
//!
//! The registry is plain data assembled once on first use and read-only
//! afterwards. Every [`DesignationKey`] maps to exactly one
//! [`DatasetConfig`]; the exhaustive match in `dataset_config` keeps the two
//! in step at compile time.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::normalize::{normalize_designation, Fallback, NormalizeOptions, NoteField};
use crate::row::RawRow;
use crate::spatial::{TableRef, TableTiers};
use crate::types::{DatasetSource, DesignationItem};

/// Result cap for generic designation datasets.
pub const MAX_GENERIC_RESULTS: usize = 12;
pub const MAX_CONSERVATION_RESULTS: usize = 10;
pub const MAX_FLOOD_RESULTS: usize = 8;

// ── Keys ──────────────────────────────────────────────────────

/// Every supported designation dataset, in response order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumCount,
)]
#[serde(rename_all = "camelCase")]
pub enum DesignationKey {
    AgriculturalLandClassification,
    AncientWoodland,
    ArchaeologicalPriorityAreas,
    AreasOfOutstandingNaturalBeauty,
    Article4DirectionAreas,
    AssetsOfCommunityValue,
    Battlefields,
    Borders,
    BrownfieldLand,
    BrownfieldSites,
    BuiltUpAreas,
    CertificatesOfImmunity,
    DesignCodeAreas,
    FloodStorageAreas,
    GreenBelt,
    ListedBuildings,
    LocalPlanningAuthorities,
    LocalAuthorityDistricts,
    NationalParks,
    Parishes,
    ParksAndGardens,
    PlanningApplications,
    RamsarSites,
    Regions,
    ScheduledMonuments,
    SitesOfSpecialScientificInterest,
    SpecialAreasOfConservation,
    SpecialProtectionAreas,
    TitleBoundaries,
    Wards,
    WorldHeritageSites,
    WorldHeritageSiteBufferZones,
}

impl DesignationKey {
    /// Response field name.
    pub fn as_str(self) -> &'static str {
        use DesignationKey::*;
        match self {
            AgriculturalLandClassification => "agriculturalLandClassification",
            AncientWoodland => "ancientWoodland",
            ArchaeologicalPriorityAreas => "archaeologicalPriorityAreas",
            AreasOfOutstandingNaturalBeauty => "areasOfOutstandingNaturalBeauty",
            Article4DirectionAreas => "article4DirectionAreas",
            AssetsOfCommunityValue => "assetsOfCommunityValue",
            Battlefields => "battlefields",
            Borders => "borders",
            BrownfieldLand => "brownfieldLand",
            BrownfieldSites => "brownfieldSites",
            BuiltUpAreas => "builtUpAreas",
            CertificatesOfImmunity => "certificatesOfImmunity",
            DesignCodeAreas => "designCodeAreas",
            FloodStorageAreas => "floodStorageAreas",
            GreenBelt => "greenBelt",
            ListedBuildings => "listedBuildings",
            LocalPlanningAuthorities => "localPlanningAuthorities",
            LocalAuthorityDistricts => "localAuthorityDistricts",
            NationalParks => "nationalParks",
            Parishes => "parishes",
            ParksAndGardens => "parksAndGardens",
            PlanningApplications => "planningApplications",
            RamsarSites => "ramsarSites",
            Regions => "regions",
            ScheduledMonuments => "scheduledMonuments",
            SitesOfSpecialScientificInterest => "sitesOfSpecialScientificInterest",
            SpecialAreasOfConservation => "specialAreasOfConservation",
            SpecialProtectionAreas => "specialProtectionAreas",
            TitleBoundaries => "titleBoundaries",
            Wards => "wards",
            WorldHeritageSites => "worldHeritageSites",
            WorldHeritageSiteBufferZones => "worldHeritageSiteBufferZones",
        }
    }

    /// Human-readable dataset label.
    pub fn label(self) -> &'static str {
        use DesignationKey::*;
        match self {
            AgriculturalLandClassification => "Agricultural land classification",
            AncientWoodland => "Ancient woodland",
            ArchaeologicalPriorityAreas => "Archaeological priority areas",
            AreasOfOutstandingNaturalBeauty => "Areas of Outstanding Natural Beauty",
            Article4DirectionAreas => "Article 4 direction areas",
            AssetsOfCommunityValue => "Assets of community value",
            Battlefields => "Battlefields",
            Borders => "National borders",
            BrownfieldLand => "Brownfield land",
            BrownfieldSites => "Brownfield sites",
            BuiltUpAreas => "Built-up areas",
            CertificatesOfImmunity => "Certificates of immunity",
            DesignCodeAreas => "Design code areas",
            FloodStorageAreas => "Flood storage areas",
            GreenBelt => "Green Belt",
            ListedBuildings => "Listed buildings",
            LocalPlanningAuthorities => "Local planning authorities",
            LocalAuthorityDistricts => "Local authority districts",
            NationalParks => "National parks",
            Parishes => "Parishes",
            ParksAndGardens => "Parks and gardens",
            PlanningApplications => "Planning applications",
            RamsarSites => "Ramsar sites",
            Regions => "Regions",
            ScheduledMonuments => "Scheduled monuments",
            SitesOfSpecialScientificInterest => "Sites of Special Scientific Interest",
            SpecialAreasOfConservation => "Special Areas of Conservation",
            SpecialProtectionAreas => "Special Protection Areas",
            TitleBoundaries => "Title boundaries",
            Wards => "Wards",
            WorldHeritageSites => "World Heritage Sites",
            WorldHeritageSiteBufferZones => "World Heritage Site buffer zones",
        }
    }
}

impl std::fmt::Display for DesignationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Configs ───────────────────────────────────────────────────

/// Query target and normalization policy for one designation dataset.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub key: DesignationKey,
    pub tiers: TableTiers,
    /// ORDER BY body referring to the table as `t`.
    pub order_by: Option<&'static str>,
    pub limit: usize,
    pub options: NormalizeOptions,
}

impl DatasetConfig {
    fn new(key: DesignationKey, tiers: TableTiers) -> Self {
        Self {
            key,
            tiers,
            order_by: None,
            limit: MAX_GENERIC_RESULTS,
            options: NormalizeOptions::default(),
        }
    }

    fn order_by(mut self, clause: &'static str) -> Self {
        self.order_by = Some(clause);
        self
    }

    fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn normalize(&self, row: &RawRow, source: DatasetSource) -> DesignationItem {
        normalize_designation(row, source, &self.options)
    }
}

/// Tables and caps for the two datasets with dedicated record shapes.
#[derive(Debug, Clone, Copy)]
pub struct FixedDataset {
    pub tiers: TableTiers,
    pub order_by: Option<&'static str>,
    /// Rows requested per tier.
    pub query_limit: usize,
    /// Records kept after deduplication.
    pub result_limit: usize,
}

pub const CONSERVATION_AREAS: FixedDataset = FixedDataset {
    tiers: TableTiers::with_app(
        TableRef::new("app.conservation_area_public"),
        TableRef::new("core.conservation_area_core"),
    ),
    order_by: Some("t.designated_at desc nulls last, t.name asc"),
    query_limit: MAX_CONSERVATION_RESULTS,
    result_limit: MAX_CONSERVATION_RESULTS,
};

pub const FLOOD_ZONES: FixedDataset = FixedDataset {
    tiers: TableTiers::with_app(
        TableRef::new("app.flood_risk_zones"),
        TableRef::new("core.flood_risk_zones_core"),
    ),
    order_by: None,
    query_limit: MAX_FLOOD_RESULTS * 2,
    result_limit: MAX_FLOOD_RESULTS,
};

static REGISTRY: LazyLock<Vec<DatasetConfig>> =
    LazyLock::new(|| DesignationKey::iter().map(dataset_config).collect());

/// All designation configs, in [`DesignationKey`] order.
pub fn registry() -> &'static [DatasetConfig] {
    &REGISTRY
}

pub fn config_for(key: DesignationKey) -> &'static DatasetConfig {
    // REGISTRY is built from DesignationKey::iter(), so discriminant order
    // and index agree.
    &REGISTRY[key as usize]
}

const BY_NAME: &str = "t.name asc";
const BY_NAME_NULLS_LAST: &str = "t.name asc nulls last";
const BY_START_DATE: &str = "t.start_date desc nulls last, t.name asc";

fn core(table: &'static str) -> TableTiers {
    TableTiers::core_only(TableRef::new(table))
}

fn dataset_config(key: DesignationKey) -> DatasetConfig {
    use DesignationKey::*;
    let opts = NormalizeOptions::default;
    match key {
        AgriculturalLandClassification => {
            DatasetConfig::new(key, core("core.agricultural_land_classification_core"))
                .order_by(BY_NAME_NULLS_LAST)
                .options(
                    opts()
                        .designation_field("agricultural_land_classification_grade")
                        .notes([NoteField::labeled(
                            "Grade",
                            "agricultural_land_classification_grade",
                        )]),
                )
        }
        AncientWoodland => DatasetConfig::new(
            key,
            TableTiers::with_app(
                TableRef::new("app.ancient_woodland_public"),
                TableRef::new("core.ancient_woodland_core"),
            ),
        )
        .order_by(BY_NAME)
        .options(
            opts()
                .designation_field("ancient_status")
                .notes([NoteField::Computed(area_note)]),
        ),
        ArchaeologicalPriorityAreas => {
            DatasetConfig::new(key, core("core.archaeological_priority_area_core"))
                .order_by(BY_NAME)
                .options(opts().notes([NoteField::labeled(
                    "Risk tier",
                    "archaeological_risk_tier",
                )]))
        }
        AreasOfOutstandingNaturalBeauty => {
            DatasetConfig::new(key, core("core.area_of_outstanding_natural_beauty_core"))
                .order_by(BY_START_DATE)
                .options(
                    opts()
                        .documentation_fields(&["documentation_url", "website"])
                        .notes([
                            NoteField::Computed(wikipedia_note),
                            NoteField::Computed(wikidata_note),
                        ]),
                )
        }
        Article4DirectionAreas => {
            DatasetConfig::new(key, core("core.article_4_direction_area_core"))
                .order_by(BY_START_DATE)
                .options(opts().notes([
                    NoteField::labeled("Direction", "article_4_direction"),
                    NoteField::labeled("Description", "description"),
                ]))
        }
        AssetsOfCommunityValue => {
            DatasetConfig::new(key, core("core.asset_of_community_value_core"))
                .order_by("t.decision_date desc nulls last, t.name asc")
                .options(opts().notes([
                    NoteField::labeled("Decision", "decision"),
                    NoteField::Computed(decision_date_note),
                    NoteField::Computed(|r| r.date("expiry_date")),
                    NoteField::Computed(|r| r.date("nomination_date")),
                    NoteField::labeled("Nominating group", "nominating_group"),
                ]))
        }
        Battlefields => DatasetConfig::new(key, core("core.battlefield_core"))
            .order_by(BY_NAME)
            .options(
                opts()
                    .documentation_fields(&["documentation_url", "document_url"])
                    .notes([
                        NoteField::Computed(wikipedia_note),
                        NoteField::Computed(wikidata_note),
                    ]),
            ),
        Borders => DatasetConfig::new(key, core("core.border_core")).order_by(BY_NAME),
        BrownfieldLand => DatasetConfig::new(key, core("core.brownfield_land_core"))
            .order_by(BY_START_DATE)
            .options(
                opts()
                    .documentation_fields(&["site_plan_url", "documentation_url"])
                    .notes([
                        NoteField::labeled("Deliverable", "deliverable"),
                        NoteField::labeled("Ownership", "ownership_status"),
                        NoteField::labeled("Planning status", "planning_permission_status"),
                        NoteField::labeled("Planning type", "planning_permission_type"),
                        NoteField::labeled("Maximum dwellings", "maximum_net_dwellings"),
                        NoteField::labeled("Minimum dwellings", "minimum_net_dwellings"),
                    ]),
            ),
        BrownfieldSites => DatasetConfig::new(key, core("core.brownfield_site_core"))
            .order_by(BY_START_DATE)
            .options(opts().notes([NoteField::labeled("Site code", "brownfield_site")])),
        BuiltUpAreas => DatasetConfig::new(key, core("core.built_up_area_core")).order_by(BY_NAME),
        CertificatesOfImmunity => {
            DatasetConfig::new(key, core("core.certificate_of_immunity_core")).order_by(BY_NAME)
        }
        DesignCodeAreas => {
            DatasetConfig::new(key, core("core.designcodearea_core")).order_by(BY_NAME)
        }
        FloodStorageAreas => DatasetConfig::new(key, core("core.floodstoragearea_core"))
            .order_by(BY_NAME)
            .options(
                opts()
                    .default_name(Fallback::Static("Flood storage area"))
                    .default_designation(Fallback::Static("Flood storage area")),
            ),
        GreenBelt => DatasetConfig::new(
            key,
            TableTiers::with_app(
                TableRef::new("app.green_belt_public"),
                TableRef::new("core.green_belt"),
            ),
        )
        .options(
            opts()
                .default_name(Fallback::Static("Green Belt"))
                .default_designation(Fallback::Static("Green Belt"))
                .category_field("local_authority_district")
                .notes([NoteField::plain("typology")]),
        ),
        ListedBuildings => DatasetConfig::new(key, core("core.listedbuilding_core"))
            .order_by(BY_START_DATE)
            .options(
                opts()
                    .designation_field("grade")
                    .notes([NoteField::labeled("Grade", "grade")]),
            ),
        LocalPlanningAuthorities => DatasetConfig::new(
            key,
            TableTiers::with_app(
                TableRef::new("app.local_planning_authority_public").geometry("boundary"),
                TableRef::new("core.local_planning_authority_core").geometry("boundary"),
            ),
        )
        .order_by("t.valid_to desc nulls last, t.name asc")
        .limit(4)
        .options(
            opts()
                .default_designation(Fallback::Static("Local planning authority"))
                .documentation_fields(&["source_url"])
                .notes([
                    NoteField::Computed(lpa_status_note),
                    NoteField::labeled("Source", "source_name"),
                ]),
        ),
        LocalAuthorityDistricts => {
            DatasetConfig::new(key, core("core.localauthoritydistrict_core")).order_by(BY_NAME)
        }
        NationalParks => {
            DatasetConfig::new(key, core("core.nationalpark_core")).order_by(BY_START_DATE)
        }
        Parishes => DatasetConfig::new(key, core("core.parish_core")).order_by(BY_NAME),
        ParksAndGardens => DatasetConfig::new(key, core("core.parkandgarden_core"))
            .order_by(BY_START_DATE)
            .options(opts().notes([NoteField::labeled("Grade", "park_and_garden_grade")])),
        PlanningApplications => DatasetConfig::new(key, core("core.planningapplication_core"))
            .order_by("t.decision_date desc nulls last, t.start_date desc nulls last")
            .options(opts().notes([
                NoteField::labeled("Decision", "planning_decision"),
                NoteField::Computed(decision_date_note),
                NoteField::labeled("Decision type", "planning_decision_type"),
                NoteField::labeled("Status", "planning_application_status"),
            ])),
        RamsarSites => DatasetConfig::new(key, core("core.ramsar_core"))
            .order_by(BY_NAME)
            .options(opts().notes([
                NoteField::labeled("Ramsar ID", "ramsar"),
                NoteField::labeled("SPA", "special_protection_area"),
                NoteField::Computed(wikipedia_note),
            ])),
        Regions => DatasetConfig::new(key, core("core.region_core")).order_by(BY_NAME),
        ScheduledMonuments => {
            DatasetConfig::new(key, core("core.scheduledmonument_core")).order_by(BY_START_DATE)
        }
        SitesOfSpecialScientificInterest => {
            DatasetConfig::new(key, core("core.siteofspecialscientificinterest_core"))
                .order_by(BY_NAME)
        }
        SpecialAreasOfConservation => {
            DatasetConfig::new(key, core("core.specialareaofconservation_core"))
                .order_by(BY_START_DATE)
        }
        SpecialProtectionAreas => {
            DatasetConfig::new(key, core("core.specialprotectionarea_core"))
                .order_by(BY_START_DATE)
        }
        TitleBoundaries => DatasetConfig::new(key, core("core.titleboundary_core"))
            .order_by("t.start_date desc nulls last, t.reference asc")
            .options(
                opts()
                    .default_name(Fallback::Static("Title boundary"))
                    .default_designation(Fallback::Static("Title boundary")),
            ),
        Wards => DatasetConfig::new(key, core("core.ward_core")).order_by(BY_NAME),
        WorldHeritageSites => DatasetConfig::new(key, core("core.worldheritagesite_core"))
            .order_by(BY_START_DATE)
            .options(opts().notes([
                NoteField::Computed(|r| {
                    r.text("world_heritage_convention_site")
                        .map(|site| format!("Convention site: {site}"))
                }),
                NoteField::Computed(wikipedia_note),
                NoteField::Computed(wikidata_note),
            ])),
        WorldHeritageSiteBufferZones => {
            DatasetConfig::new(key, core("core.worldheritagesitebufferzone_core"))
                .order_by(BY_START_DATE)
                .options(opts().notes([NoteField::labeled(
                    "World Heritage Site",
                    "world_heritage_site",
                )]))
        }
    }
}

// ── Computed notes ────────────────────────────────────────────

fn area_note(row: &RawRow) -> Option<String> {
    row.text("area_ha").map(|area| format!("Area: {area} ha"))
}

fn wikipedia_note(row: &RawRow) -> Option<String> {
    row.text("wikipedia")
        .map(|slug| format!("Wikipedia: https://en.wikipedia.org/wiki/{slug}"))
}

fn wikidata_note(row: &RawRow) -> Option<String> {
    row.text("wikidata").map(|id| format!("Wikidata: {id}"))
}

fn lpa_status_note(row: &RawRow) -> Option<String> {
    match row.flag("is_active")? {
        true => Some("Status: Active".to_string()),
        false => Some("Status: Historical".to_string()),
    }
}

/// Computed segments carry the bare value, no label.
fn decision_date_note(row: &RawRow) -> Option<String> {
    row.date("decision_date")
}
