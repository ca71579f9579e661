//! Row normalizer - raw designation rows to canonical records.
//!
//! Pure functions only. Nothing here fails: partial or oddly-typed rows
//! degrade field by field to `None`, and every record leaves with a
//! non-empty `id`.

use std::collections::HashSet;

use crate::row::RawRow;
use crate::types::{
    ConservationAreaItem, DatasetSource, DesignationItem, FloodZoneItem, Identified,
};

/// Separator between composite note segments.
pub const NOTE_SEPARATOR: &str = " • ";

/// Computes a value from a whole row.
pub type RowFn = fn(&RawRow) -> Option<String>;

/// Value used when the configured column is empty.
#[derive(Debug, Clone, Copy, Default)]
pub enum Fallback {
    #[default]
    None,
    Static(&'static str),
    Computed(RowFn),
}

impl Fallback {
    fn resolve(&self, row: &RawRow) -> Option<String> {
        match self {
            Self::None => None,
            Self::Static(value) => Some((*value).to_string()),
            Self::Computed(f) => f(row),
        }
    }
}

/// One segment of the composite `notes` string.
#[derive(Debug, Clone, Copy)]
pub enum NoteField {
    /// A column value, rendered `"Label: value"` when labelled.
    Field {
        field: &'static str,
        label: Option<&'static str>,
    },
    /// A fully formatted segment computed from the row.
    Computed(RowFn),
}

impl NoteField {
    pub const fn labeled(label: &'static str, field: &'static str) -> Self {
        Self::Field {
            field,
            label: Some(label),
        }
    }

    pub const fn plain(field: &'static str) -> Self {
        Self::Field { field, label: None }
    }

    fn render(&self, row: &RawRow) -> Option<String> {
        match self {
            Self::Field { field, label } => {
                let value = row.text(field)?;
                Some(match label {
                    Some(label) => format!("{label}: {value}"),
                    None => value,
                })
            }
            Self::Computed(f) => f(row),
        }
    }
}

/// Per-dataset field mapping for [`normalize_designation`].
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub name_field: &'static str,
    pub designation_field: Option<&'static str>,
    pub category_field: &'static str,
    pub reference_field: &'static str,
    /// Dataset-specific identifier column tried after `entity`.
    pub id_fallback_field: &'static str,
    pub date_fields: &'static [&'static str],
    pub documentation_fields: &'static [&'static str],
    pub notes: Vec<NoteField>,
    pub default_name: Fallback,
    pub default_designation: Fallback,
    pub include_row_notes: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            name_field: "name",
            designation_field: Some("typology"),
            category_field: "dataset",
            reference_field: "reference",
            id_fallback_field: "ogc_fid",
            date_fields: &["start_date", "entry_date", "designation_date", "valid_from"],
            documentation_fields: &["documentation_url"],
            notes: Vec::new(),
            default_name: Fallback::None,
            default_designation: Fallback::None,
            include_row_notes: true,
        }
    }
}

impl NormalizeOptions {
    pub fn designation_field(mut self, field: &'static str) -> Self {
        self.designation_field = Some(field);
        self
    }

    pub fn category_field(mut self, field: &'static str) -> Self {
        self.category_field = field;
        self
    }

    pub fn documentation_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.documentation_fields = fields;
        self
    }

    pub fn notes(mut self, notes: impl IntoIterator<Item = NoteField>) -> Self {
        self.notes = notes.into_iter().collect();
        self
    }

    pub fn default_name(mut self, fallback: Fallback) -> Self {
        self.default_name = fallback;
        self
    }

    pub fn default_designation(mut self, fallback: Fallback) -> Self {
        self.default_designation = fallback;
        self
    }
}

/// Normalize one generic designation row.
pub fn normalize_designation(
    row: &RawRow,
    source: DatasetSource,
    options: &NormalizeOptions,
) -> DesignationItem {
    let id = row.identifier(&[
        "id",
        "reference",
        "dataset",
        "entity",
        options.id_fallback_field,
        "name",
    ]);

    let name = row
        .text(options.name_field)
        .or_else(|| options.default_name.resolve(row));
    let designation = options
        .designation_field
        .and_then(|field| row.text(field))
        .or_else(|| options.default_designation.resolve(row));

    let designation_date = options
        .date_fields
        .iter()
        .find_map(|field| row.date(field));

    let documentation_url = options
        .documentation_fields
        .iter()
        .filter_map(|field| row.text(field))
        .find(|value| value.starts_with("http"));

    let mut segments = Vec::new();
    if options.include_row_notes {
        segments.extend(row.text("notes"));
    }
    segments.extend(options.notes.iter().filter_map(|note| note.render(row)));
    let notes = (!segments.is_empty()).then(|| segments.join(NOTE_SEPARATOR));

    DesignationItem {
        id,
        name,
        designation,
        category: row.text(options.category_field),
        reference: row.text(options.reference_field),
        designation_date,
        documentation_url,
        notes,
        source,
    }
}

pub fn normalize_conservation_area(row: &RawRow, source: DatasetSource) -> ConservationAreaItem {
    ConservationAreaItem {
        id: row.identifier(&["id", "reference"]),
        name: row.text("name"),
        lpa: row.text("lpa"),
        designated_at: row.date("designated_at"),
        source,
    }
}

/// Flood zone record. The curated tier keys zones by their planning
/// reference (then entity), never by the table's serial `id`, so polygons
/// sharing a reference collapse to one record.
pub fn normalize_flood_zone(row: &RawRow, source: DatasetSource) -> FloodZoneItem {
    let id_fields: &[&str] = match source {
        DatasetSource::App => &["reference", "entity", "dataset", "name"],
        DatasetSource::Core => &["id", "reference", "entity", "dataset", "name"],
    };
    FloodZoneItem {
        id: row.identifier(id_fields),
        name: row.text("name"),
        level: row.text("flood_risk_level"),
        zone_type: row.text("flood_risk_type"),
        dataset: row.text("dataset"),
        source,
    }
}

/// Drop items whose `id` has already been seen, keeping first occurrences
/// in their original order.
pub fn dedupe_by_id<T: Identified>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id().to_string()))
        .collect()
}
