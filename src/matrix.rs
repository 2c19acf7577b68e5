//! Employee-by-skill matrices.
//!
//! A [`SkillMatrix`] is the raw binary input: one row per employee, one column
//! per skill, every cell 0 or 1. A [`NormalizedMatrix`] is the same matrix with
//! each column standardized to zero mean and unit variance so that Euclidean
//! distances between employees are comparable across skills.
//!
//! ```text
//! z_ij = (x_ij - μ_j) / σ_j      (σ_j > 0)
//! z_ij = 0                       (σ_j = 0, constant column)
//! ```
//!
//! σ is the population standard deviation.

use std::collections::{BTreeSet, HashSet};

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde_json::Value;

use crate::error::{Error, Result};

/// Name of the identifier column in tabular input.
pub const EMPLOYEE_ID: &str = "employee_id";

/// Binary employee-by-skill matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatrix {
    employee_ids: Vec<String>,
    skill_names: Vec<String>,
    values: Array2<u8>,
}

impl SkillMatrix {
    /// Build a matrix from row vectors.
    ///
    /// # Errors
    ///
    /// - [`Error::InputShape`] if the row count differs from the id count or a
    ///   row's length differs from the skill count.
    /// - [`Error::NonBinaryValue`] if a cell is not 0 or 1.
    /// - [`Error::DuplicateSkill`] if a skill name repeats.
    pub fn new(
        employee_ids: Vec<String>,
        skill_names: Vec<String>,
        rows: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if rows.len() != employee_ids.len() {
            return Err(Error::input_shape(
                format!("{} rows (one per employee id)", employee_ids.len()),
                format!("{} rows", rows.len()),
            ));
        }

        let mut seen = HashSet::with_capacity(skill_names.len());
        for name in &skill_names {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateSkill(name.clone()));
            }
        }

        let n_skills = skill_names.len();
        let mut flat = Vec::with_capacity(rows.len() * n_skills);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != n_skills {
                return Err(Error::input_shape(
                    format!("{n_skills} columns in row {r}"),
                    format!("{} columns", row.len()),
                ));
            }
            for (c, &v) in row.iter().enumerate() {
                if v > 1 {
                    return Err(Error::NonBinaryValue {
                        row: r,
                        column: skill_names[c].clone(),
                        value: v.to_string(),
                    });
                }
            }
            flat.extend_from_slice(row);
        }

        let values = Array2::from_shape_vec((rows.len(), n_skills), flat)
            .map_err(|e| Error::input_shape(format!("{} x {n_skills}", rows.len()), e.to_string()))?;

        Ok(Self {
            employee_ids,
            skill_names,
            values,
        })
    }

    /// Build a matrix from tabular records.
    ///
    /// Each record is a JSON object with an `employee_id` field and one field
    /// per skill. Skill columns are taken from the first record (every key
    /// except `employee_id`, sorted). Cells accept booleans, the numbers 0 and
    /// 1, and the strings `"0"`, `"1"`, `"true"`, `"false"`. A skill key absent
    /// from a later record counts as 0.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let skill_names: Vec<String> = match records.first() {
            Some(Value::Object(first)) => first
                .keys()
                .filter(|k| k.as_str() != EMPLOYEE_ID)
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            Some(_) => {
                return Err(Error::input_shape("record object", "non-object record"));
            }
            None => Vec::new(),
        };

        let mut employee_ids = Vec::with_capacity(records.len());
        let mut rows = Vec::with_capacity(records.len());

        for (r, record) in records.iter().enumerate() {
            let obj = record
                .as_object()
                .ok_or_else(|| Error::input_shape("record object", format!("record {r} is not an object")))?;

            let id = match obj.get(EMPLOYEE_ID) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(Error::MissingIdentifier { row: r }),
            };
            employee_ids.push(id);

            let mut row = Vec::with_capacity(skill_names.len());
            for skill in &skill_names {
                let cell = match obj.get(skill) {
                    None | Some(Value::Null) => 0,
                    Some(v) => coerce_binary(v).ok_or_else(|| Error::NonBinaryValue {
                        row: r,
                        column: skill.clone(),
                        value: v.to_string(),
                    })?,
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Self::new(employee_ids, skill_names, rows)
    }

    /// Number of employees (rows).
    pub fn n_employees(&self) -> usize {
        self.values.nrows()
    }

    /// Number of skills (columns).
    pub fn n_skills(&self) -> usize {
        self.values.ncols()
    }

    /// Employee identifiers in row order.
    pub fn employee_ids(&self) -> &[String] {
        &self.employee_ids
    }

    /// Skill names in column order.
    pub fn skill_names(&self) -> &[String] {
        &self.skill_names
    }

    /// Raw 0/1 values.
    pub fn values(&self) -> ArrayView2<'_, u8> {
        self.values.view()
    }

    /// Whether employee `row` has skill `col`.
    #[inline]
    pub fn has_skill(&self, row: usize, col: usize) -> bool {
        self.values[[row, col]] == 1
    }

    /// Number of employees holding each skill.
    pub fn skill_counts(&self) -> Vec<usize> {
        self.values
            .axis_iter(Axis(1))
            .map(|col| col.iter().filter(|&&v| v == 1).count())
            .collect()
    }

    /// Number of skills each employee holds.
    pub fn row_sums(&self) -> Vec<usize> {
        self.values
            .axis_iter(Axis(0))
            .map(|row| row.iter().filter(|&&v| v == 1).count())
            .collect()
    }

    /// Values as `f64` indicators.
    pub fn to_indicator(&self) -> Array2<f64> {
        self.values.mapv(f64::from)
    }
}

fn coerce_binary(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => {
            let x = n.as_f64()?;
            if x == 0.0 {
                Some(0)
            } else if x == 1.0 {
                Some(1)
            } else {
                None
            }
        }
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" => Some(0),
            "1" | "true" => Some(1),
            _ => None,
        },
        _ => None,
    }
}

/// Column-standardized view of a [`SkillMatrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMatrix {
    data: Array2<f64>,
}

impl NormalizedMatrix {
    /// Standardized values, same shape as the source matrix.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Consume into the underlying array.
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

/// Standardize every column to zero mean and unit variance.
///
/// Constant columns (including all-zero skills) map to 0 instead of dividing
/// by zero. An empty matrix normalizes to an empty matrix.
pub fn normalize(matrix: &SkillMatrix) -> NormalizedMatrix {
    let raw = matrix.to_indicator();
    let n = raw.nrows();
    if n == 0 {
        return NormalizedMatrix { data: raw };
    }

    let mean: Array1<f64> = raw.sum_axis(Axis(0)) / n as f64;
    let mut data = raw;
    for (mut col, &mu) in data.axis_iter_mut(Axis(1)).zip(mean.iter()) {
        let var = col.iter().map(|&x| (x - mu).powi(2)).sum::<f64>() / n as f64;
        let sd = var.sqrt();
        if sd > f64::EPSILON {
            col.mapv_inplace(|x| (x - mu) / sd);
        } else {
            col.fill(0.0);
        }
    }

    NormalizedMatrix { data }
}
