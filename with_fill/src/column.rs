//! Conversions between Arrow arrays and [`Value`]s.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, ArrowPrimitiveType, AsArray, PrimitiveArray},
    datatypes::{
        DataType, Date32Type, Date64Type, DurationMicrosecondType, DurationMillisecondType,
        DurationNanosecondType, DurationSecondType, Float32Type, Float64Type, Int8Type, Int16Type,
        Int32Type, Int64Type, Time32MillisecondType, Time32SecondType, Time64MicrosecondType,
        Time64NanosecondType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
        TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type, UInt32Type,
        UInt64Type,
    },
};

use crate::{Error, Result, value::Value};

/// Expands `$body` with `$t` bound to the primitive Arrow type of `$data_type`.
/// Evaluates `$otherwise` for types that cannot be held in a [`Value`].
macro_rules! with_numeric_type {
    ($data_type:expr, $t:ident => $body:expr, _ => $otherwise:expr) => {
        match $data_type {
            DataType::Int8 => { type $t = Int8Type; $body }
            DataType::Int16 => { type $t = Int16Type; $body }
            DataType::Int32 => { type $t = Int32Type; $body }
            DataType::Int64 => { type $t = Int64Type; $body }
            DataType::UInt8 => { type $t = UInt8Type; $body }
            DataType::UInt16 => { type $t = UInt16Type; $body }
            DataType::UInt32 => { type $t = UInt32Type; $body }
            DataType::UInt64 => { type $t = UInt64Type; $body }
            DataType::Float32 => { type $t = Float32Type; $body }
            DataType::Float64 => { type $t = Float64Type; $body }
            DataType::Date32 => { type $t = Date32Type; $body }
            DataType::Date64 => { type $t = Date64Type; $body }
            DataType::Time32(TimeUnit::Second) => { type $t = Time32SecondType; $body }
            DataType::Time32(TimeUnit::Millisecond) => { type $t = Time32MillisecondType; $body }
            DataType::Time64(TimeUnit::Microsecond) => { type $t = Time64MicrosecondType; $body }
            DataType::Time64(TimeUnit::Nanosecond) => { type $t = Time64NanosecondType; $body }
            DataType::Timestamp(TimeUnit::Second, _) => { type $t = TimestampSecondType; $body }
            DataType::Timestamp(TimeUnit::Millisecond, _) => { type $t = TimestampMillisecondType; $body }
            DataType::Timestamp(TimeUnit::Microsecond, _) => { type $t = TimestampMicrosecondType; $body }
            DataType::Timestamp(TimeUnit::Nanosecond, _) => { type $t = TimestampNanosecondType; $body }
            DataType::Duration(TimeUnit::Second) => { type $t = DurationSecondType; $body }
            DataType::Duration(TimeUnit::Millisecond) => { type $t = DurationMillisecondType; $body }
            DataType::Duration(TimeUnit::Microsecond) => { type $t = DurationMicrosecondType; $body }
            DataType::Duration(TimeUnit::Nanosecond) => { type $t = DurationNanosecondType; $body }
            _ => $otherwise,
        }
    };
}

/// Native types of the Arrow primitives a [`Value`] can be stored in.
pub(crate) trait NativeValue: Copy {
    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! native_int {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeValue for $native {
                fn into_value(self) -> Value {
                    Value::$variant(self.into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_i128().and_then(|v| Self::try_from(v).ok())
                }
            }
        )*
    };
}

native_int!(
    i8 => Int, i16 => Int, i32 => Int, i64 => Int,
    u8 => UInt, u16 => UInt, u32 => UInt, u64 => UInt,
);

impl NativeValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self.into())
    }

    fn from_value(value: &Value) -> Option<Self> {
        let v = value.as_f64()?;
        let narrowed = v as Self;
        (narrowed.is_finite() == v.is_finite()).then_some(narrowed)
    }
}

impl NativeValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

/// Rounds `value` to the nearest `f32`, the way it is stored in a `Float32`
/// column. `None` if it is out of the `f32` range.
pub(crate) fn round_to_f32(value: Value) -> Option<Value> {
    if value.is_null() {
        return Some(value);
    }
    f32::from_value(&value).map(NativeValue::into_value)
}

/// True if values of `data_type` can be generated by filling.
pub(crate) fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Date32
            | DataType::Date64
            | DataType::Time32(TimeUnit::Second | TimeUnit::Millisecond)
            | DataType::Time64(TimeUnit::Microsecond | TimeUnit::Nanosecond)
            | DataType::Timestamp(_, _)
            | DataType::Duration(_)
    )
}

/// True if `value` can be stored in a column of `data_type` without loss.
pub(crate) fn fits(value: &Value, data_type: &DataType) -> bool {
    if value.is_null() {
        return true;
    }
    with_numeric_type!(
        data_type,
        T => fits_native::<T>(value),
        _ => false
    )
}

fn fits_native<T>(value: &Value) -> bool
where
    T: ArrowPrimitiveType,
    T::Native: NativeValue,
{
    match (value, T::DATA_TYPE.is_floating()) {
        (Value::Float(_), false) => false,
        _ => T::Native::from_value(value).is_some(),
    }
}

/// Reads the cell at `row` of `array`.
pub(crate) fn value_at(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    with_numeric_type!(
        array.data_type(),
        T => Ok(array.as_primitive::<T>().value(row).into_value()),
        _ => Err(Error::UnsupportedType {
            data_type: array.data_type().clone(),
        })
    )
}

/// Builds an array of `data_type` holding `values`, nulls included.
pub(crate) fn values_to_array(data_type: &DataType, values: &[Value]) -> Result<ArrayRef> {
    with_numeric_type!(
        data_type,
        T => build_primitive::<T>(data_type, values),
        _ => Err(Error::UnsupportedType {
            data_type: data_type.clone(),
        })
    )
}

fn build_primitive<T>(data_type: &DataType, values: &[Value]) -> Result<ArrayRef>
where
    T: ArrowPrimitiveType,
    T::Native: NativeValue,
{
    let array = values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            value => T::Native::from_value(value)
                .map(Some)
                .ok_or_else(|| Error::ValueOutOfRange {
                    value: *value,
                    data_type: data_type.clone(),
                }),
        })
        .collect::<Result<PrimitiveArray<T>>>()?
        // carries the timezone of timestamp columns
        .with_data_type(data_type.clone());
    Ok(Arc::new(array))
}
