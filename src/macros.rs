//! Utility macros for code generation.

#![macro_use]

/// Evaluates `$e` with `$v` bound to the typed array held by a `FieldData`.
///
/// Every arm must produce the same type, so `$e` is usually a call to a function generic over
/// the scalar type.
/// # Examples
/// ```rust
/// # #[macro_use] extern crate visfile;
/// # use visfile::model::FieldData;
/// # fn main() {
/// let data = FieldData::from(vec![1.0f32, 2.0, 3.0]);
/// let len = match_field!(&data; arr => arr.len());
/// assert_eq!(len, 3);
/// # }
/// ```
#[macro_export]
macro_rules! match_field {
    ($data:expr; $v:pat => $e:expr) => {
        match $data {
            $crate::model::FieldData::I8($v) => $e,
            $crate::model::FieldData::U8($v) => $e,
            $crate::model::FieldData::I16($v) => $e,
            $crate::model::FieldData::U16($v) => $e,
            $crate::model::FieldData::I32($v) => $e,
            $crate::model::FieldData::U32($v) => $e,
            $crate::model::FieldData::I64($v) => $e,
            $crate::model::FieldData::U64($v) => $e,
            $crate::model::FieldData::F32($v) => $e,
            $crate::model::FieldData::F64($v) => $e,
        }
    };
}
