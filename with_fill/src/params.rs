//! Configuration of the fill operator: the sort key as written in a query's
//! `ORDER BY ... WITH FILL` clause, and its validated form.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result, column,
    value::{Direction, Value, less},
};

/// The `WITH FILL [FROM from] [TO to] [STEP step]` part of a sort key column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FillSpec {
    /// First value to generate. Null means filling starts at the first row.
    #[serde(default)]
    pub from: Value,
    /// Last value that may be generated. Null means filling stops at the last row.
    #[serde(default)]
    pub to: Value,
    /// Increment between generated values. Defaults to `1` ascending, `-1` descending.
    #[serde(default)]
    pub step: Option<Value>,
}

impl FillSpec {
    /// A fill with no bounds and the default step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `FROM` bound.
    pub fn with_from(self, from: impl Into<Value>) -> Self {
        Self {
            from: from.into(),
            ..self
        }
    }

    /// Sets the `TO` bound.
    pub fn with_to(self, to: impl Into<Value>) -> Self {
        Self {
            to: to.into(),
            ..self
        }
    }

    /// Sets the `STEP`.
    pub fn with_step(self, step: impl Into<Value>) -> Self {
        Self {
            step: Some(step.into()),
            ..self
        }
    }
}

/// One column of the sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    /// Name of the column in the input schema.
    pub column: String,
    /// Sort direction of the column.
    #[serde(default)]
    pub direction: Direction,
    /// Present if the column is `WITH FILL`.
    #[serde(default)]
    pub fill: Option<FillSpec>,
}

impl SortKey {
    /// A sort-only column.
    pub fn plain(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
            fill: None,
        }
    }

    /// A column whose gaps are filled.
    pub fn fill(column: impl Into<String>, direction: Direction, fill: FillSpec) -> Self {
        Self {
            column: column.into(),
            direction,
            fill: Some(fill),
        }
    }
}

/// The sort key of the input, most significant column first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKeySpec(Vec<SortKey>);

impl SortKeySpec {
    /// Creates a sort key from its columns, most significant first.
    pub fn new(keys: impl IntoIterator<Item = SortKey>) -> Self {
        Self(keys.into_iter().collect())
    }

    /// Parses a sort key from its JSON form, e.g.
    ///
    /// ```text
    /// [
    ///   {"column": "host"},
    ///   {"column": "time", "direction": "desc", "fill": {"from": 10, "to": 0, "step": -2}}
    /// ]
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The columns of the sort key.
    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    /// Number of columns in the sort key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no columns in the sort key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A validated sort key column, resolved against the input schema.
///
/// Plain sort columns have null bounds and no step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnFill {
    position: usize,
    direction: Direction,
    from: Value,
    to: Value,
    step: Option<Value>,
    /// Generated values are rounded to `f32`, as in a `Float32` column.
    single_precision: bool,
}

impl ColumnFill {
    /// Position of the column in the input schema.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Sort direction of the column.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// First value to generate, null if unbounded.
    pub fn from(&self) -> Value {
        self.from
    }

    /// Last value that may be generated, null if unbounded.
    pub fn to(&self) -> Value {
        self.to
    }

    /// The step, `None` for a sort-only column.
    pub fn step(&self) -> Option<Value> {
        self.step
    }

    /// True if the column is `WITH FILL`.
    pub fn is_fill(&self) -> bool {
        self.step.is_some()
    }

    /// Adds the step to `value`, at the precision of the column. `None` for a
    /// sort-only column or if the result is out of range.
    pub(crate) fn step_from(&self, value: &Value) -> Option<Value> {
        let next = value.checked_add(&self.step?)?;
        if self.single_precision {
            column::round_to_f32(next)
        } else {
            Some(next)
        }
    }

    /// True if there is room to generate values between `from` and `value`.
    pub(crate) fn starts_before(&self, value: &Value) -> bool {
        !self.from.is_null() && less(&self.from, value, self.direction)
    }
}

/// The validated fill configuration for one input schema.
///
/// Column positions are split once into the sort key columns, whose
/// values are generated, and the other columns, which are copied from
/// real rows and null in generated rows.
#[derive(Debug, Clone)]
pub struct FillParams {
    columns: Vec<ColumnFill>,
    other_positions: Vec<usize>,
    schema: SchemaRef,
}

impl FillParams {
    /// Validates `sort_key` against `schema`.
    pub fn try_new(schema: &SchemaRef, sort_key: &SortKeySpec) -> Result<Self> {
        if sort_key.is_empty() {
            return Err(Error::EmptySortKey);
        }

        let mut is_key_column = vec![false; schema.fields().len()];
        let mut columns = Vec::with_capacity(sort_key.len());
        for key in sort_key.keys() {
            let position = schema
                .index_of(&key.column)
                .map_err(|_| Error::ColumnNotFound {
                    column_name: key.column.clone(),
                })?;
            if std::mem::replace(&mut is_key_column[position], true) {
                return Err(Error::DuplicateColumn {
                    column_name: key.column.clone(),
                });
            }
            let data_type = schema.field(position).data_type();
            columns.push(resolve_column(key, position, data_type)?);
        }

        let other_positions = is_key_column
            .iter()
            .enumerate()
            .filter_map(|(position, is_key)| (!is_key).then_some(position))
            .collect();

        Ok(Self {
            columns,
            other_positions,
            schema: output_schema(schema),
        })
    }

    /// The sort key columns, most significant first.
    pub fn columns(&self) -> &[ColumnFill] {
        &self.columns
    }

    /// The sort key column at `index` in the key (not the schema).
    pub fn column(&self, index: usize) -> &ColumnFill {
        &self.columns[index]
    }

    /// Direction of the sort key column at `index`.
    pub fn direction(&self, index: usize) -> Direction {
        self.columns[index].direction
    }

    /// Number of sort key columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a validated sort key has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Schema positions of the columns that are not part of the sort key.
    pub fn other_positions(&self) -> &[usize] {
        &self.other_positions
    }

    /// Schema of the filled output.
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

fn resolve_column(key: &SortKey, position: usize, data_type: &DataType) -> Result<ColumnFill> {
    // the cursor holds a value for every key column, filled or not
    if !column::is_numeric(data_type) {
        return Err(Error::NonNumericColumn {
            column_name: key.column.clone(),
            data_type: data_type.clone(),
        });
    }

    let single_precision = matches!(data_type, DataType::Float32);
    let Some(fill) = key.fill else {
        return Ok(ColumnFill {
            position,
            direction: key.direction,
            from: Value::Null,
            to: Value::Null,
            step: None,
            single_precision,
        });
    };

    let (from, to) = normalize_bounds(&key.column, fill.from, fill.to)?;
    for bound in [from, to] {
        if data_type.is_unsigned_integer() && less(&bound, &Value::Int(0), Direction::Ascending) {
            return Err(Error::NegativeUnsignedBound {
                column_name: key.column.clone(),
                data_type: data_type.clone(),
            });
        }
        if !column::fits(&bound, data_type) {
            return Err(Error::BoundOutOfRange {
                column_name: key.column.clone(),
                value: bound,
                data_type: data_type.clone(),
            });
        }
    }

    let (from, to) = if single_precision {
        // bounds are held at the precision of the column
        (
            column::round_to_f32(from).unwrap_or(from),
            column::round_to_f32(to).unwrap_or(to),
        )
    } else {
        (from, to)
    };

    let step = fill
        .step
        .unwrap_or(Value::Int(i64::from(key.direction.as_i8())));
    let integer_column_with_float_step =
        matches!(step, Value::Float(_)) && !data_type.is_floating();
    if step.signum() != Some(key.direction.as_i8()) || integer_column_with_float_step {
        return Err(Error::InvalidStep {
            column_name: key.column.clone(),
            step,
            direction: key.direction,
        });
    }

    Ok(ColumnFill {
        position,
        direction: key.direction,
        from,
        to,
        step: Some(step),
        single_precision,
    })
}

/// Casts a signed/unsigned pair of bounds to signed, so that generating
/// rows across zero never wraps around.
fn normalize_bounds(column_name: &str, from: Value, to: Value) -> Result<(Value, Value)> {
    let to_signed = |v: u64| {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| Error::IncompatibleBounds {
                column_name: column_name.to_string(),
                from,
                to,
            })
    };
    match (from, to) {
        (Value::UInt(f), Value::Int(_)) => Ok((to_signed(f)?, to)),
        (Value::Int(_), Value::UInt(t)) => Ok((from, to_signed(t)?)),
        _ => Ok((from, to)),
    }
}

/// Generated rows leave non-key columns null, so every output column is nullable.
fn output_schema(schema: &Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_nullable(true))
        .collect();
    Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
}
