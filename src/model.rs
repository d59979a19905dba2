//!
//! Typed field data and named data arrays.
//!
//! A [`DataArray`] is the unit of payload in a VTK XML file: a name, a scalar type, a component
//! count and the encoded bytes of a row-major `(num_elem, components)` matrix. Arrays are built
//! from `ndarray` arrays wrapped in [`FieldData`], which erases the scalar type.
//!
//! Cloning a `DataArray` is cheap: clones share the encoded buffer until one of them is
//! re-encoded into a different representation.
//!

use std::fmt;
use std::sync::Arc;

use byteorder::{ByteOrder as _, NativeEndian};
use log::debug;
use ndarray::{s, Array, Array2, ArrayD, ArrayView, Axis, Dimension, Ix2};
use num_traits::{NumCast, Zero};

use crate::buffer::{self, ByteOrder, Compressor, EncodedBuffer, Encoder};
use crate::xml::Element;

/// Error produced while constructing a data array.
#[derive(Debug)]
pub enum Error {
    /// Arrays of rank greater than 2 cannot be stored.
    UnsupportedRank(usize),
    /// A rank 2 array in vector layout does not have unit stride along its component axis.
    NotRowMajor,
    /// A component list was given with no components.
    NoComponents,
    ComponentShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    ComponentTypeMismatch {
        expected: ScalarType,
        found: ScalarType,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedRank(rank) => {
                write!(f, "Arrays of rank {} are not supported, expected at most 2", rank)
            }
            Error::NotRowMajor => write!(f, "2D arrays must be row-major"),
            Error::NoComponents => write!(f, "Component list is empty"),
            Error::ComponentShapeMismatch { expected, found } => write!(
                f,
                "Component shape mismatch: expected {:?}, found {:?}",
                expected, found
            ),
            Error::ComponentTypeMismatch { expected, found } => write!(
                f,
                "Component type mismatch: expected {}, found {}",
                expected, found
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Element type of a data array.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    /// Read a single host-order element and widen it to `f64`.
    fn native_to_f64(self, bytes: &[u8]) -> f64 {
        match self {
            ScalarType::I8 => bytes[0] as i8 as f64,
            ScalarType::U8 => bytes[0] as f64,
            ScalarType::I16 => NativeEndian::read_i16(bytes) as f64,
            ScalarType::U16 => NativeEndian::read_u16(bytes) as f64,
            ScalarType::I32 => NativeEndian::read_i32(bytes) as f64,
            ScalarType::U32 => NativeEndian::read_u32(bytes) as f64,
            ScalarType::I64 => NativeEndian::read_i64(bytes) as f64,
            ScalarType::U64 => NativeEndian::read_u64(bytes) as f64,
            ScalarType::F32 => NativeEndian::read_f32(bytes) as f64,
            ScalarType::F64 => NativeEndian::read_f64(bytes),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarType::I8 => write!(f, "Int8"),
            ScalarType::U8 => write!(f, "UInt8"),
            ScalarType::I16 => write!(f, "Int16"),
            ScalarType::U16 => write!(f, "UInt16"),
            ScalarType::I32 => write!(f, "Int32"),
            ScalarType::U32 => write!(f, "UInt32"),
            ScalarType::I64 => write!(f, "Int64"),
            ScalarType::U64 => write!(f, "UInt64"),
            ScalarType::F32 => write!(f, "Float32"),
            ScalarType::F64 => write!(f, "Float64"),
        }
    }
}

/// Numeric types that can be stored in a data array.
pub trait Scalar: bytemuck::Pod + Zero + NumCast + fmt::Debug + Send + Sync + 'static {
    const SCALAR_TYPE: ScalarType;
    fn field_ref(field: &FieldData) -> Option<&ArrayD<Self>>;
    fn into_field(arr: ArrayD<Self>) -> FieldData;
}

macro_rules! impl_scalar {
    ($t:ident, $v:ident) => {
        impl Scalar for $t {
            const SCALAR_TYPE: ScalarType = ScalarType::$v;
            fn field_ref(field: &FieldData) -> Option<&ArrayD<Self>> {
                match field {
                    FieldData::$v(arr) => Some(arr),
                    _ => None,
                }
            }
            fn into_field(arr: ArrayD<Self>) -> FieldData {
                FieldData::$v(arr)
            }
        }
    };
}

impl_scalar!(i8, I8);
impl_scalar!(u8, U8);
impl_scalar!(i16, I16);
impl_scalar!(u16, U16);
impl_scalar!(i32, I32);
impl_scalar!(u32, U32);
impl_scalar!(i64, I64);
impl_scalar!(u64, U64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

/// An n-dimensional array of any supported scalar type.
#[derive(Clone, PartialEq, Debug)]
pub enum FieldData {
    I8(ArrayD<i8>),
    U8(ArrayD<u8>),
    I16(ArrayD<i16>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    U32(ArrayD<u32>),
    I64(ArrayD<i64>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl FieldData {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldData::I8(_) => ScalarType::I8,
            FieldData::U8(_) => ScalarType::U8,
            FieldData::I16(_) => ScalarType::I16,
            FieldData::U16(_) => ScalarType::U16,
            FieldData::I32(_) => ScalarType::I32,
            FieldData::U32(_) => ScalarType::U32,
            FieldData::I64(_) => ScalarType::I64,
            FieldData::U64(_) => ScalarType::U64,
            FieldData::F32(_) => ScalarType::F32,
            FieldData::F64(_) => ScalarType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match_field!(self; arr => arr.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of scalars.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Scalar, D: Dimension> From<Array<T, D>> for FieldData {
    fn from(arr: Array<T, D>) -> FieldData {
        T::into_field(arr.into_dyn())
    }
}

impl<T: Scalar> From<Vec<T>> for FieldData {
    fn from(v: Vec<T>) -> FieldData {
        T::into_field(Array::from(v).into_dyn())
    }
}

/// Memory layout of rank 2 input arrays.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum VectorFormat {
    /// Axis 0 indexes components and axis 1 indexes entities.
    #[default]
    ListOfComponents,
    /// Axis 0 indexes entities and axis 1 indexes components.
    ListOfVectors,
}

/// Options controlling how input arrays are normalized into a data array.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DataArrayOptions {
    /// Minimum number of components of a vector array. Missing components are filled with zeros.
    pub vector_padding: usize,
    pub vector_format: VectorFormat,
}

impl Default for DataArrayOptions {
    fn default() -> Self {
        DataArrayOptions {
            vector_padding: 3,
            vector_format: VectorFormat::default(),
        }
    }
}

impl DataArrayOptions {
    pub fn vectors() -> Self {
        DataArrayOptions {
            vector_format: VectorFormat::ListOfVectors,
            ..Default::default()
        }
    }
}

/// A named array of `num_elem` entities with `components` scalars each.
#[derive(Clone, Debug)]
pub struct DataArray {
    name: String,
    scalar_type: ScalarType,
    components: usize,
    num_elem: usize,
    buffer: Arc<EncodedBuffer>,
}

impl PartialEq for DataArray {
    /// Arrays are equal if they describe the same values, regardless of their current encoding.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.scalar_type == other.scalar_type
            && self.components == other.components
            && self.num_elem == other.num_elem
            && match (self.buffer.raw_buffer(), other.buffer.raw_buffer()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
    }
}

impl DataArray {
    /// Build a data array with default options.
    pub fn new(name: impl Into<String>, data: impl Into<FieldData>) -> Result<Self, Error> {
        Self::with_options(name, data, DataArrayOptions::default())
    }

    /// Build a data array from an array of rank 0, 1 or 2.
    ///
    /// Rank 1 arrays hold one scalar per entity. Rank 2 arrays are interpreted according to
    /// `options.vector_format` and padded with zero components up to `options.vector_padding`.
    pub fn with_options(
        name: impl Into<String>,
        data: impl Into<FieldData>,
        options: DataArrayOptions,
    ) -> Result<Self, Error> {
        let name = name.into();
        let data: FieldData = data.into();
        match_field!(data; arr => from_array(name, arr, &options))
    }

    /// Build a data array from a list of equally shaped arrays, one per component.
    ///
    /// The components are stacked along a new leading axis, so the default
    /// [`VectorFormat::ListOfComponents`] layout applies to rank 1 components.
    pub fn from_components(
        name: impl Into<String>,
        components: Vec<FieldData>,
        options: DataArrayOptions,
    ) -> Result<Self, Error> {
        let first = components.first().ok_or(Error::NoComponents)?;
        for comp in components.iter() {
            if comp.scalar_type() != first.scalar_type() {
                return Err(Error::ComponentTypeMismatch {
                    expected: first.scalar_type(),
                    found: comp.scalar_type(),
                });
            }
            if comp.shape() != first.shape() {
                return Err(Error::ComponentShapeMismatch {
                    expected: first.shape().to_vec(),
                    found: comp.shape().to_vec(),
                });
            }
        }
        let stacked = match_field!(first; arr => stack_like(arr, &components)?);
        Self::with_options(name, stacked, options)
    }

    /// A new name for the data of `other`. The encoded buffer is shared, not copied.
    pub fn alias(name: impl Into<String>, other: &DataArray) -> Self {
        DataArray {
            name: name.into(),
            ..other.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of entities (rows) stored in this array.
    pub fn num_elem(&self) -> usize {
        self.num_elem
    }

    /// The buffer in its current representation.
    pub fn encoded_buffer(&self) -> &EncodedBuffer {
        &self.buffer
    }

    /// Whether `self` and `other` currently share the same encoded buffer.
    pub fn shares_buffer_with(&self, other: &DataArray) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Convert the buffer into the requested representation and return it.
    ///
    /// Nothing is done if the buffer is already in that representation. Otherwise the old
    /// representation is released before the new one is built. If building fails, the array
    /// is left holding its raw binary bytes.
    pub fn get_encoded_buffer(
        &mut self,
        encoder: Encoder,
        compressor: Option<Compressor>,
    ) -> Result<&EncodedBuffer, buffer::Error> {
        buffer::check_encoding(encoder, compressor)?;
        if self.buffer.is_encoded_as(encoder, compressor) {
            return Ok(&self.buffer);
        }

        debug!(
            "Re-encoding \"{}\" from {}/{:?} to {}/{:?}",
            self.name,
            self.buffer.encoder(),
            self.buffer.compressor(),
            encoder,
            compressor
        );

        if self.buffer.encoder() != Encoder::Binary {
            let raw = self.buffer.raw_buffer()?;
            self.buffer = Arc::new(EncodedBuffer::Binary(raw));
        }

        if encoder != Encoder::Binary {
            if let EncodedBuffer::Binary(raw) = &*self.buffer {
                let encoded = EncodedBuffer::encode(raw, encoder, compressor)?;
                self.buffer = Arc::new(encoded);
            }
        }

        Ok(&self.buffer)
    }

    /// Base64 encode this array with the given compressor into `elem`.
    ///
    /// Returns the number of characters appended.
    pub fn encode(
        &mut self,
        compressor: Option<Compressor>,
        elem: &mut Element,
    ) -> Result<usize, buffer::Error> {
        self.get_encoded_buffer(Encoder::Base64, compressor)?
            .add_to_xml_element(elem)
    }

    /// Same as [`DataArray::encode`] but writes values and header words in `byte_order`.
    ///
    /// Host order output goes through the cached buffer. For the opposite order a temporary
    /// swapped copy is encoded and the cached buffer is left untouched.
    pub fn encode_with_byte_order(
        &mut self,
        compressor: Option<Compressor>,
        byte_order: ByteOrder,
        elem: &mut Element,
    ) -> Result<usize, buffer::Error> {
        if byte_order == ByteOrder::native() {
            return self.encode(compressor, elem);
        }

        let mut raw = self.buffer.raw_buffer()?;
        let width = self.scalar_type.size();
        if width > 1 {
            for value in raw.chunks_exact_mut(width) {
                value.reverse();
            }
        }
        EncodedBuffer::encode_with_byte_order(&raw, Encoder::Base64, compressor, byte_order)?
            .add_to_xml_element(elem)
    }

    /// Decode the values into one `f64` column per component.
    pub fn components_f64(&self) -> Result<Vec<Vec<f64>>, buffer::Error> {
        let raw = self.buffer.raw_buffer()?;
        let width = self.scalar_type.size();
        let mut columns = vec![Vec::with_capacity(self.num_elem); self.components];
        if self.components == 0 {
            return Ok(columns);
        }
        for (i, value) in raw.chunks_exact(width).enumerate() {
            columns[i % self.components].push(self.scalar_type.native_to_f64(value));
        }
        Ok(columns)
    }
}

fn from_array<T: Scalar>(
    name: String,
    arr: ArrayD<T>,
    options: &DataArrayOptions,
) -> Result<DataArray, Error> {
    let (num_elem, components, raw) = match arr.ndim() {
        0 | 1 => (arr.len(), 1, to_bytes(arr.view())),
        2 => {
            let arr = arr
                .into_dimensionality::<Ix2>()
                .map_err(|_| Error::UnsupportedRank(2))?;
            let arr = match options.vector_format {
                VectorFormat::ListOfComponents => arr.t().as_standard_layout().into_owned(),
                VectorFormat::ListOfVectors => arr,
            };

            let (num_elem, given) = arr.dim();
            // Strides of an empty array are all zero.
            if num_elem > 0 && given > 1 && arr.strides()[1] != 1 {
                return Err(Error::NotRowMajor);
            }

            if options.vector_padding > given {
                let mut padded = Array2::<T>::zeros((num_elem, options.vector_padding));
                padded.slice_mut(s![.., ..given]).assign(&arr);
                (num_elem, options.vector_padding, to_bytes(padded.view()))
            } else {
                (num_elem, given, to_bytes(arr.view()))
            }
        }
        rank => return Err(Error::UnsupportedRank(rank)),
    };

    Ok(DataArray {
        name,
        scalar_type: T::SCALAR_TYPE,
        components,
        num_elem,
        buffer: Arc::new(EncodedBuffer::Binary(raw)),
    })
}

/// Host-order bytes of `arr` in logical (row-major) order.
fn to_bytes<T: Scalar, D: Dimension>(arr: ArrayView<T, D>) -> Vec<u8> {
    match arr.as_slice() {
        Some(slice) => bytemuck::cast_slice(slice).to_vec(),
        None => {
            let contiguous: Vec<T> = arr.iter().copied().collect();
            bytemuck::cast_slice(&contiguous).to_vec()
        }
    }
}

/// Stack `components` along a new leading axis. `_first` fixes the scalar type.
fn stack_like<T: Scalar>(_first: &ArrayD<T>, components: &[FieldData]) -> Result<FieldData, Error> {
    let views = components
        .iter()
        .map(|comp| {
            T::field_ref(comp)
                .map(|arr| arr.view())
                .ok_or(Error::ComponentTypeMismatch {
                    expected: T::SCALAR_TYPE,
                    found: comp.scalar_type(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let stacked = ndarray::stack(Axis(0), &views).map_err(|_| Error::ComponentShapeMismatch {
        expected: views[0].shape().to_vec(),
        found: Vec::new(),
    })?;
    Ok(T::into_field(stacked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3, ShapeBuilder};

    fn values(data: &DataArray) -> Vec<Vec<f64>> {
        data.components_f64().unwrap()
    }

    #[test]
    fn scalar_array() -> Result<(), Error> {
        let data = DataArray::new("pressure", arr1(&[1.0f64, 2.0, 3.0]))?;
        assert_eq!(data.name(), "pressure");
        assert_eq!(data.scalar_type(), ScalarType::F64);
        assert_eq!(data.scalar_type().to_string(), "Float64");
        assert_eq!(data.components(), 1);
        assert_eq!(data.num_elem(), 3);
        assert_eq!(data.encoded_buffer().encoder(), Encoder::Binary);
        assert_eq!(values(&data), vec![vec![1.0, 2.0, 3.0]]);
        Ok(())
    }

    #[test]
    fn list_of_components_is_transposed_and_padded() -> Result<(), Error> {
        // Two components of four entities each.
        let comps = arr2(&[[1i32, 2, 3, 4], [5, 6, 7, 8]]);
        let data = DataArray::new("velocity", comps)?;
        assert_eq!(data.components(), 3);
        assert_eq!(data.num_elem(), 4);
        assert_eq!(
            values(&data),
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![5.0, 6.0, 7.0, 8.0],
                vec![0.0; 4]
            ]
        );
        Ok(())
    }

    #[test]
    fn list_of_vectors_keeps_layout() -> Result<(), Error> {
        let vecs = arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let opts = DataArrayOptions {
            vector_padding: 0,
            vector_format: VectorFormat::ListOfVectors,
        };
        let data = DataArray::with_options("v", vecs, opts)?;
        assert_eq!(data.components(), 2);
        assert_eq!(data.num_elem(), 3);
        assert_eq!(values(&data), vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
        Ok(())
    }

    #[test]
    fn wide_vectors_are_not_padded() -> Result<(), Error> {
        let vecs = Array2::<u16>::zeros((2, 5));
        let data = DataArray::with_options("w", vecs, DataArrayOptions::vectors())?;
        assert_eq!(data.components(), 5);
        Ok(())
    }

    #[test]
    fn column_major_vectors_are_rejected() {
        let vecs = Array2::<f64>::zeros((4, 3).f());
        let res = DataArray::with_options("v", vecs, DataArrayOptions::vectors());
        assert!(matches!(res, Err(Error::NotRowMajor)));
    }

    #[test]
    fn rank_three_is_rejected() {
        let res = DataArray::new("cube", Array3::<f64>::zeros((2, 2, 2)));
        assert!(matches!(res, Err(Error::UnsupportedRank(3))));
    }

    #[test]
    fn component_list_is_stacked() -> Result<(), Error> {
        let comps = vec![
            FieldData::from(vec![1u8, 2, 3]),
            FieldData::from(vec![4u8, 5, 6]),
        ];
        let data = DataArray::from_components("c", comps, DataArrayOptions::default())?;
        assert_eq!(data.scalar_type(), ScalarType::U8);
        assert_eq!(data.components(), 3);
        assert_eq!(data.num_elem(), 3);
        assert_eq!(values(&data)[1], vec![4.0, 5.0, 6.0]);
        Ok(())
    }

    #[test]
    fn component_list_mismatches() {
        let res = DataArray::from_components(
            "c",
            vec![FieldData::from(vec![1u8, 2]), FieldData::from(vec![1u8])],
            DataArrayOptions::default(),
        );
        assert!(matches!(res, Err(Error::ComponentShapeMismatch { .. })));

        let res = DataArray::from_components(
            "c",
            vec![FieldData::from(vec![1u8]), FieldData::from(vec![1i8])],
            DataArrayOptions::default(),
        );
        assert!(matches!(res, Err(Error::ComponentTypeMismatch { .. })));

        let res = DataArray::from_components("c", Vec::new(), DataArrayOptions::default());
        assert!(matches!(res, Err(Error::NoComponents)));
    }

    #[test]
    fn alias_shares_buffer() -> Result<(), Error> {
        let data = DataArray::new("a", vec![1.0f64, 2.0])?;
        let alias = DataArray::alias("b", &data);
        assert_eq!(alias.name(), "b");
        assert_eq!(alias.components(), 1);
        assert!(alias.shares_buffer_with(&data));
        Ok(())
    }

    #[test]
    fn reencoding_detaches_alias() -> Result<(), Box<dyn std::error::Error>> {
        let data = DataArray::new("a", vec![1.0f64, 2.0])?;
        let mut alias = DataArray::alias("b", &data);
        alias.get_encoded_buffer(Encoder::Base64, None)?;
        assert!(!alias.shares_buffer_with(&data));
        assert_eq!(data.encoded_buffer().encoder(), Encoder::Binary);
        assert_eq!(alias.encoded_buffer().encoder(), Encoder::Base64);
        assert_eq!(values(&alias), values(&data));
        Ok(())
    }

    #[test]
    fn repeated_encoding_is_cached() -> Result<(), Box<dyn std::error::Error>> {
        let mut data = DataArray::new("a", vec![7i64; 10])?;
        let first = data.get_encoded_buffer(Encoder::Base64, None)?.clone();
        let copy = data.clone();
        data.get_encoded_buffer(Encoder::Base64, None)?;
        assert!(data.shares_buffer_with(&copy));
        assert_eq!(data.encoded_buffer(), &first);

        data.get_encoded_buffer(Encoder::Binary, None)?;
        assert_eq!(values(&data), vec![vec![7.0; 10]]);
        Ok(())
    }

    #[test]
    fn invalid_encoding_keeps_buffer() -> Result<(), Box<dyn std::error::Error>> {
        let mut data = DataArray::new("a", vec![1u32, 2])?;
        data.get_encoded_buffer(Encoder::Base64, None)?;
        let res = data.get_encoded_buffer(Encoder::Binary, Some(Compressor::ZLib));
        assert!(matches!(res, Err(buffer::Error::InvalidEncoding { .. })));
        assert_eq!(data.encoded_buffer().encoder(), Encoder::Base64);
        Ok(())
    }

    #[test]
    fn swapped_byte_order() -> Result<(), Box<dyn std::error::Error>> {
        let mut data = DataArray::new("a", vec![1u16, 2])?;
        let other = match ByteOrder::native() {
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
        };
        let mut elem = Element::new("DataArray");
        data.encode_with_byte_order(None, other, &mut elem)?;

        use base64::{engine::general_purpose::STANDARD, Engine};
        let body = elem.children()[1].as_text().unwrap_or_default();
        let expected: Vec<u8> = [1u16, 2]
            .iter()
            .flat_map(|v| match other {
                ByteOrder::BigEndian => v.to_be_bytes(),
                ByteOrder::LittleEndian => v.to_le_bytes(),
            })
            .collect();
        assert_eq!(STANDARD.decode(body)?, expected);
        // The cached buffer is untouched.
        assert_eq!(data.encoded_buffer().encoder(), Encoder::Binary);
        Ok(())
    }

    #[test]
    fn empty_array() -> Result<(), Error> {
        let data = DataArray::new("empty", Vec::<f32>::new())?;
        assert_eq!(data.num_elem(), 0);
        assert_eq!(values(&data), vec![Vec::<f64>::new()]);
        Ok(())
    }

    #[test]
    fn empty_vectors() -> Result<(), Error> {
        let data = DataArray::new("points", Array2::<f32>::zeros((3, 0)))?;
        assert_eq!(data.num_elem(), 0);
        assert_eq!(data.components(), 3);
        assert_eq!(values(&data), vec![Vec::<f64>::new(); 3]);

        let data = DataArray::with_options(
            "velocity",
            Array2::<f64>::zeros((0, 2)),
            DataArrayOptions::vectors(),
        )?;
        assert_eq!(data.num_elem(), 0);
        assert_eq!(data.components(), 3);
        Ok(())
    }
}
