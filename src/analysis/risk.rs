use ahash::AHashSet;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::{error::{Error, Result}, layer::{Layer, GEOMETRY_COLUMN}};

/// Column holding the synthesized risk-area/subprefecture identifier.
pub const COMPOSITE_ID_COLUMN: &str = "id_area_subprefeitura";

/// Literal placed between the risk-area and subprefecture identifiers.
pub const COMPOSITE_ID_SEPARATOR: &str = ".subpref.";

/// Column selection and filtering for [`prepare_risk_area`].
#[derive(Debug, Clone, Default)]
pub struct RiskAreaOptions {
    /// Risk-area identifier column (default: first attribute column).
    pub risk_area_id_col: Option<String>,
    /// Text contained in the name of the risk-grade column (case-sensitive).
    pub risk_grade_col_prefix: String,
    /// Grade values starting with this text are kept (case-insensitive).
    pub active_risk_prefix: String,
    /// Subprefecture identifier column (default: first attribute column).
    pub subprefeitura_id_col: Option<String>,
    /// Extra subprefecture columns to carry into the result.
    pub subprefeitura_additional_cols: Vec<String>,
}

impl RiskAreaOptions {
    pub fn new(risk_grade_col_prefix: impl Into<String>, active_risk_prefix: impl Into<String>) -> Self {
        Self {
            risk_grade_col_prefix: risk_grade_col_prefix.into(),
            active_risk_prefix: active_risk_prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_risk_area_id_col(mut self, col: impl Into<String>) -> Self {
        self.risk_area_id_col = Some(col.into());
        self
    }

    pub fn with_subprefeitura_id_col(mut self, col: impl Into<String>) -> Self {
        self.subprefeitura_id_col = Some(col.into());
        self
    }

    pub fn with_subprefeitura_additional_cols<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.subprefeitura_additional_cols = cols.into_iter().map(Into::into).collect();
        self
    }
}

/// Map active risk areas onto subprefectures.
///
/// Keeps the risk areas whose grade (read from the single column whose name contains
/// `risk_grade_col_prefix`) starts with `active_risk_prefix`, ignoring case, intersects
/// them with the subprefecture layer (identifier, requested extra columns and geometry),
/// and prefixes the result with `id_area_subprefeitura` =
/// `<risk id>.subpref.<subprefecture id>`. A risk area crossing several subprefectures
/// yields one record per subprefecture. The identifier is null when either part is null.
pub fn prepare_risk_area(risk_area: &Layer, subprefeitura: &Layer, options: &RiskAreaOptions) -> Result<Layer> {
    let grade_col = find_grade_column(risk_area, &options.risk_grade_col_prefix)?;

    let risk_id_col = match &options.risk_area_id_col {
        Some(col) => { risk_area.column(col)?; col.clone() }
        None => risk_area.first_column()?,
    };
    let subpref_id_col = match &options.subprefeitura_id_col {
        Some(col) => { subprefeitura.column(col)?; col.clone() }
        None => subprefeitura.first_column()?,
    };

    let active = options.active_risk_prefix.to_lowercase();
    let mask = risk_area.string_values(&grade_col)?.iter()
        .map(|grade| grade.as_ref().is_some_and(|grade| grade.to_lowercase().starts_with(&active)))
        .collect::<Vec<_>>();
    let active_areas = risk_area.filter(&mask)?;

    let mut subpref_cols = vec![subpref_id_col.clone()];
    for col in &options.subprefeitura_additional_cols {
        if col != GEOMETRY_COLUMN && !subpref_cols.contains(col) {
            subpref_cols.push(col.clone());
        }
    }
    let subprefs = subprefeitura.select(&subpref_cols)?;

    let overlay = active_areas.overlay_intersection(&subprefs)?;

    let composite = overlay.string_values(&risk_id_col)?.into_iter()
        .zip(overlay.string_values(&subpref_id_col)?)
        .map(|(risk_id, subpref_id)| match (risk_id, subpref_id) {
            (Some(risk_id), Some(subpref_id)) => Some(format!("{risk_id}{COMPOSITE_ID_SEPARATOR}{subpref_id}")),
            _ => None,
        })
        .collect::<Vec<_>>();

    let duplicates = count_duplicates(&composite);
    if duplicates > 0 {
        warn!(duplicates, "composite risk-area identifiers are not unique");
    }

    debug!(
        risk_areas = risk_area.len(), active = active_areas.len(), fragments = overlay.len(),
        grade_col = grade_col.as_str(),
        "prepared risk areas"
    );

    overlay
        .with_column(Column::new(COMPOSITE_ID_COLUMN.into(), composite))?
        .with_column_first(COMPOSITE_ID_COLUMN)
}

/// The single column whose name contains `prefix`.
fn find_grade_column(layer: &Layer, prefix: &str) -> Result<String> {
    let mut matches = layer.column_names().into_iter()
        .filter(|name| name.contains(prefix))
        .collect::<Vec<_>>();
    match matches.len() {
        0 => Err(Error::invalid(format!("no column name contains {prefix:?}"))),
        1 => Ok(matches.remove(0)),
        _ => Err(Error::invalid(format!("column prefix {prefix:?} is ambiguous: {matches:?}"))),
    }
}

fn count_duplicates(ids: &[Option<String>]) -> usize {
    let mut seen = AHashSet::new();
    ids.iter().flatten().filter(|id| !seen.insert(id.as_str())).count()
}
