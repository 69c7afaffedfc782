//! serde helpers implementing the proto3 JSON mapping for prost scalars.

use serde::Serializer;

use crate::pb::{ErrorOp, Stage, TaskOp};

/// Enumerations that can be written by symbolic name.
pub(crate) trait ProtoEnum: TryFrom<i32> {
    fn as_str_name(&self) -> &'static str;
}

/// Writes a prost enum field (stored as `i32`) by name.
///
/// Values outside the known range are written as the raw number.
fn enum_name<E, S>(value: &i32, serializer: S) -> Result<S::Ok, S::Error>
where
    E: ProtoEnum,
    S: Serializer,
{
    match E::try_from(*value) {
        Ok(known) => serializer.serialize_str(known.as_str_name()),
        Err(_) => serializer.serialize_i32(*value),
    }
}

pub(crate) fn task_op<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<TaskOp, S>(value, serializer)
}

pub(crate) fn error_op<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<ErrorOp, S>(value, serializer)
}

pub(crate) fn stage<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    enum_name::<Stage, S>(value, serializer)
}

/// `int64` is written as a decimal string.
pub(crate) fn int64<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
