//! The cursor of the fill operator and the algorithm that advances it.
//!
//! The cursor works like a mixed-radix counter in which every sort key
//! column is a digit with its own start, step and stop. A more
//! significant column only advances once the less significant ones have
//! run through their range, or have caught up with the row the cursor is
//! moving towards.

use std::ops::Index;

use arrow::array::ArrayRef;

use crate::{
    Result, column,
    params::{ColumnFill, FillParams},
    value::{Value, equals, less},
};

/// What the cursor is advancing towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A real input row. Generated rows stay strictly before it, because the
    /// row itself is copied to the output.
    Row,
    /// The `TO` bounds at the end of the input. The bound itself may be
    /// generated, and a null bound leaves its column unchanged.
    Bound,
}

/// One value per sort key column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillingRow {
    values: Vec<Value>,
}

impl FillingRow {
    /// A row of `len` nulls.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![Value::Null; len],
        }
    }

    /// Number of sort key columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values, most significant column first.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Copies the values at `row` of the sort key `columns` into positions
    /// `from_pos..`.
    pub fn init_from_columns(
        &mut self,
        columns: &[ArrayRef],
        row: usize,
        from_pos: usize,
    ) -> Result<()> {
        for (value, array) in self.values.iter_mut().zip(columns).skip(from_pos) {
            *value = column::value_at(array.as_ref(), row)?;
        }
        Ok(())
    }

    /// Sets positions `from_pos..` to their `FROM` bound.
    pub fn init_from_defaults(&mut self, params: &FillParams, from_pos: usize) {
        for (value, column) in self.values.iter_mut().zip(params.columns()).skip(from_pos) {
            *value = column.from();
        }
    }

    /// Sets every position to its `TO` bound.
    pub fn init_from_bounds(&mut self, params: &FillParams) {
        for (value, column) in self.values.iter_mut().zip(params.columns()) {
            *value = column.to();
        }
    }

    /// Moves to the next row before `target`, returning false (and leaving
    /// the row unchanged) when there is none.
    pub fn next(&mut self, target: &Self, kind: TargetKind, params: &FillParams) -> bool {
        match advance(self, target, kind, params.columns()) {
            Some(row) => {
                *self = row;
                true
            }
            None => false,
        }
    }
}

impl Index<usize> for FillingRow {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl FromIterator<Value> for FillingRow {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// How a single position of the cursor changes when it advances.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// Keeps its current value.
    Keep,
    /// Takes a newly stepped value.
    Set(Value),
    /// Restarts from its `FROM` bound.
    Reset,
    /// Takes the target's value, if the target has one.
    Follow,
}

/// Computes the row that follows `cursor` on the way to `target`, or
/// `None` if the cursor cannot move any closer to it.
pub fn advance(
    cursor: &FillingRow,
    target: &FillingRow,
    kind: TargetKind,
    columns: &[ColumnFill],
) -> Option<FillingRow> {
    let plan = plan(cursor, target, kind, columns)?;
    let row = plan
        .iter()
        .enumerate()
        .map(|(i, slot)| match slot {
            Slot::Keep => cursor[i],
            Slot::Set(value) => *value,
            Slot::Reset => columns[i].from(),
            Slot::Follow if target[i].is_null() => cursor[i],
            Slot::Follow => target[i],
        })
        .collect();
    Some(row)
}

fn plan(
    cursor: &FillingRow,
    target: &FillingRow,
    kind: TargetKind,
    columns: &[ColumnFill],
) -> Option<Vec<Slot>> {
    let pos = pivot(cursor, target, columns)?;
    overflow_trailing(cursor, pos, columns)
        .or_else(|| step_pivot(cursor, target, kind, pos, columns))
}

/// The most significant position where cursor and target differ. Nulls on
/// either side never differ. `None` if there is no such position or the
/// target is already behind the cursor there.
fn pivot(cursor: &FillingRow, target: &FillingRow, columns: &[ColumnFill]) -> Option<usize> {
    let pos = (0..cursor.len()).find(|&i| {
        !cursor[i].is_null() && !target[i].is_null() && !equals(&cursor[i], &target[i])
    })?;
    (!less(&target[pos], &cursor[pos], columns[pos].direction())).then_some(pos)
}

/// Lets a less significant column with a `TO` bound keep stepping through
/// its range before the pivot advances. The least significant such column
/// goes first, and everything after it starts over.
fn overflow_trailing(cursor: &FillingRow, pos: usize, columns: &[ColumnFill]) -> Option<Vec<Slot>> {
    (pos + 1..cursor.len()).rev().find_map(|i| {
        let column = &columns[i];
        if !column.is_fill() || column.to().is_null() || cursor[i].is_null() {
            return None;
        }
        let next = column.step_from(&cursor[i])?;
        if less(&column.to(), &next, column.direction()) {
            return None;
        }
        let mut plan = vec![Slot::Keep; cursor.len()];
        plan[i] = Slot::Set(next);
        plan[i + 1..].fill(Slot::Reset);
        Some(plan)
    })
}

/// Steps the pivot itself. A sort-only column cannot step, so it jumps
/// straight to the target's value.
fn step_pivot(
    cursor: &FillingRow,
    target: &FillingRow,
    kind: TargetKind,
    pos: usize,
    columns: &[ColumnFill],
) -> Option<Vec<Slot>> {
    let column = &columns[pos];
    let next = if column.is_fill() {
        column.step_from(&cursor[pos])?
    } else {
        target[pos]
    };

    let mut plan = vec![Slot::Keep; cursor.len()];
    plan[pos] = Slot::Set(next);

    if equals(&next, &target[pos]) {
        // Caught up with the target here. The first less significant column
        // that still has room before the target starts over from its bound,
        // the ones before it take the target's values.
        for i in pos + 1..cursor.len() {
            if !target[i].is_null() && columns[i].starts_before(&target[i]) {
                plan[i..].fill(Slot::Reset);
                return Some(plan);
            }
            plan[i] = Slot::Follow;
        }
        return match kind {
            TargetKind::Row => None,
            TargetKind::Bound => Some(plan),
        };
    }

    if less(&next, &target[pos], column.direction()) {
        plan[pos + 1..].fill(Slot::Reset);
        return Some(plan);
    }

    None
}
