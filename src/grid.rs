//!
//! Grid containers: unstructured grids of explicit cells and curvilinear structured grids.
//!
//! Both kinds own their geometry as [`DataArray`]s plus ordered collections of point and cell
//! attributes that are emitted in insertion order.
//!

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayD, IxDyn};
use num_derive::FromPrimitive;
use num_traits::{FromPrimitive, NumCast};

use crate::model::{self, DataArray, DataArrayOptions, FieldData, Scalar};

/// Error produced while assembling a grid.
#[derive(Debug)]
pub enum Error {
    /// The points array of an unstructured grid must be named `points`.
    PointsName(String),
    /// Offsets cannot be derived for cells without a fixed node count.
    VariableCellSize(CellType),
    UnknownCellType(u8),
    /// Structured grids must have 1, 2 or 3 dimensions.
    UnsupportedDimension(usize),
    /// The mesh must have one more axis than its leading axis size.
    MeshRank { ndims: usize, rank: usize },
    CellCountMismatch { cells: usize, types: usize },
    /// Connectivity with derived offsets must be a flat list of node indices.
    ConnectivityRank(usize),
    /// The derived offsets do not cover the connectivity array.
    ConnectivityLength { expected: usize, found: usize },
    /// An offset does not fit in the scalar type of the connectivity array.
    OffsetOverflow(usize),
    FieldShape {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    Array(model::Error),
    Shape(ndarray::ShapeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::PointsName(name) => {
                write!(f, "Points array must be named \"points\", found \"{}\"", name)
            }
            Error::VariableCellSize(t) => {
                write!(f, "Cannot derive offsets for {:?} cells with no fixed size", t)
            }
            Error::UnknownCellType(code) => write!(f, "Unknown cell type: {}", code),
            Error::UnsupportedDimension(n) => {
                write!(f, "Structured grids must have 1 to 3 dimensions, found {}", n)
            }
            Error::MeshRank { ndims, rank } => write!(
                f,
                "Mesh of {} dimensions must have rank {}, found {}",
                ndims,
                ndims + 1,
                rank
            ),
            Error::CellCountMismatch { cells, types } => {
                write!(f, "Grid has {} cells but {} cell types", cells, types)
            }
            Error::ConnectivityRank(rank) => {
                write!(f, "Connectivity must have rank 1, found rank {}", rank)
            }
            Error::ConnectivityLength { expected, found } => write!(
                f,
                "Cells use {} connectivity entries but {} were given",
                expected, found
            ),
            Error::OffsetOverflow(offset) => write!(
                f,
                "Offset {} does not fit in the connectivity scalar type",
                offset
            ),
            Error::FieldShape {
                name,
                expected,
                found,
            } => write!(
                f,
                "Field \"{}\" has shape {:?}, expected {:?}",
                name, found, expected
            ),
            Error::Array(source) => write!(f, "Data array error: {}", source),
            Error::Shape(source) => write!(f, "Shape error: {}", source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Array(source) => Some(source),
            Error::Shape(source) => Some(source),
            _ => None,
        }
    }
}

impl From<model::Error> for Error {
    fn from(e: model::Error) -> Error {
        Error::Array(e)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(e: ndarray::ShapeError) -> Error {
        Error::Shape(e)
    }
}

/// This enum describes the types of cells representable by unstructured grids.
///
/// The discriminants are the VTK cell type codes written to the `types` array. See `vtkCellType.h`
/// in the VTK sources for the full list.
#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum CellType {
    Vertex = 1,
    PolyVertex = 2,
    Line = 3,
    PolyLine = 4,
    Triangle = 5,
    TriangleStrip = 6,
    Polygon = 7,
    Pixel = 8,
    Quad = 9,
    Tetra = 10,
    Voxel = 11,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    LagrangeCurve = 68,
    LagrangeTriangle = 69,
    LagrangeQuadrilateral = 70,
    LagrangeTetrahedron = 71,
    LagrangeHexahedron = 72,
    LagrangeWedge = 73,
}

impl CellType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<CellType, Error> {
        CellType::from_u8(code).ok_or(Error::UnknownCellType(code))
    }

    /// Number of nodes of a cell of this type, or `None` if it varies from cell to cell.
    pub fn node_count(self) -> Option<usize> {
        match self {
            CellType::Vertex => Some(1),
            CellType::Line => Some(2),
            CellType::Triangle => Some(3),
            CellType::Pixel | CellType::Quad | CellType::Tetra => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Wedge => Some(6),
            CellType::Voxel | CellType::Hexahedron => Some(8),
            _ => None,
        }
    }
}

/// Cell topology given to [`UnstructuredGrid::new`].
#[derive(Clone, Debug)]
pub enum Cells {
    /// Prebuilt arrays: the number of cells, the flat connectivity and the end offset of each
    /// cell within it.
    Explicit {
        count: usize,
        connectivity: DataArray,
        offsets: DataArray,
    },
    /// Flat connectivity of fixed-size cells. Offsets are derived from the cell types and
    /// stored with the scalar type of the connectivity.
    Uniform(FieldData),
}

/// Unstructured grid of points and explicit cells, written as a `.vtu` file.
#[derive(Clone, Debug)]
pub struct UnstructuredGrid {
    pub(crate) point_count: usize,
    pub(crate) points: DataArray,
    pub(crate) cell_count: usize,
    pub(crate) cell_connectivity: DataArray,
    pub(crate) cell_offsets: DataArray,
    pub(crate) cell_types: DataArray,
    pub(crate) pointdata: Vec<DataArray>,
    pub(crate) celldata: Vec<DataArray>,
}

impl UnstructuredGrid {
    /// Assemble a grid from `(point_count, points)`, cells and one type per cell.
    pub fn new(
        points: (usize, DataArray),
        cells: Cells,
        cell_types: &[CellType],
    ) -> Result<Self, Error> {
        let (point_count, points) = points;
        if points.name() != "points" {
            return Err(Error::PointsName(points.name().to_string()));
        }

        let (cell_count, cell_connectivity, cell_offsets) = match cells {
            Cells::Explicit {
                count,
                connectivity,
                offsets,
            } => (count, connectivity, offsets),
            Cells::Uniform(connectivity) => {
                if connectivity.ndim() != 1 {
                    return Err(Error::ConnectivityRank(connectivity.ndim()));
                }
                let offsets = uniform_offsets(cell_types)?;
                let expected = offsets.last().copied().unwrap_or(0);
                if expected != connectivity.len() {
                    return Err(Error::ConnectivityLength {
                        expected,
                        found: connectivity.len(),
                    });
                }
                let offsets = match_field!(&connectivity; conn => cast_offsets(conn, &offsets)?);
                (
                    cell_types.len(),
                    DataArray::new("connectivity", connectivity)?,
                    DataArray::new("offsets", offsets)?,
                )
            }
        };

        if cell_count != cell_types.len() {
            return Err(Error::CellCountMismatch {
                cells: cell_count,
                types: cell_types.len(),
            });
        }

        let codes: Vec<u8> = cell_types.iter().map(|t| t.code()).collect();
        Ok(UnstructuredGrid {
            point_count,
            points,
            cell_count,
            cell_connectivity,
            cell_offsets,
            cell_types: DataArray::new("types", codes)?,
            pointdata: Vec::new(),
            celldata: Vec::new(),
        })
    }

    /// A grid with the same geometry and no attributes. Geometry buffers are shared.
    pub fn copy(&self) -> Self {
        UnstructuredGrid {
            pointdata: Vec::new(),
            celldata: Vec::new(),
            ..self.clone()
        }
    }

    pub fn vtk_extension(&self) -> &'static str {
        "vtu"
    }

    pub fn add_pointdata(&mut self, data: DataArray) {
        self.pointdata.push(data);
    }

    pub fn add_celldata(&mut self, data: DataArray) {
        self.celldata.push(data);
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn points(&self) -> &DataArray {
        &self.points
    }

    pub fn cell_connectivity(&self) -> &DataArray {
        &self.cell_connectivity
    }

    pub fn cell_offsets(&self) -> &DataArray {
        &self.cell_offsets
    }

    pub fn cell_types(&self) -> &DataArray {
        &self.cell_types
    }

    pub fn pointdata(&self) -> &[DataArray] {
        &self.pointdata
    }

    pub fn celldata(&self) -> &[DataArray] {
        &self.celldata
    }
}

/// Running sum of node counts, one entry per cell.
fn uniform_offsets(cell_types: &[CellType]) -> Result<Vec<usize>, Error> {
    let mut end = 0;
    cell_types
        .iter()
        .map(|&t| {
            end += t.node_count().ok_or(Error::VariableCellSize(t))?;
            Ok(end)
        })
        .collect()
}

fn cast_offsets<T: Scalar>(_conn: &ArrayD<T>, offsets: &[usize]) -> Result<FieldData, Error> {
    let offsets = offsets
        .iter()
        .map(|&o| <T as NumCast>::from(o).ok_or(Error::OffsetOverflow(o)))
        .collect::<Result<Vec<T>, _>>()?;
    Ok(FieldData::from(offsets))
}

/// A field attached to a structured grid by [`StructuredGrid::field_array`].
#[derive(Clone, Debug)]
pub enum GridField {
    /// An array shaped like the grid, optionally with a leading component axis.
    Array(FieldData),
    /// One grid-shaped array per component.
    Components(Vec<FieldData>),
}

impl From<FieldData> for GridField {
    fn from(data: FieldData) -> GridField {
        GridField::Array(data)
    }
}

impl<T: Scalar, D: ndarray::Dimension> From<ndarray::Array<T, D>> for GridField {
    fn from(arr: ndarray::Array<T, D>) -> GridField {
        GridField::Array(arr.into())
    }
}

impl From<Vec<FieldData>> for GridField {
    fn from(components: Vec<FieldData>) -> GridField {
        GridField::Components(components)
    }
}

/// Where a structured grid field lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Centering {
    Point,
    Cell,
}

/// Curvilinear grid of `ndims` dimensions, written as a `.vts` file.
///
/// Points are given as a dense mesh of shape `(ndims, n_0, ..., n_{ndims-1})`.
#[derive(Clone, Debug)]
pub struct StructuredGrid {
    pub(crate) mesh: Arc<FieldData>,
    pub(crate) ndims: usize,
    pub(crate) shape: Vec<usize>,
    pub(crate) points: DataArray,
    pub(crate) pointdata: Vec<DataArray>,
    pub(crate) celldata: Vec<DataArray>,
}

impl StructuredGrid {
    pub fn new(mesh: impl Into<FieldData>) -> Result<Self, Error> {
        let mesh = mesh.into();
        let ndims = mesh.shape().first().copied().unwrap_or(0);
        if !(1..=3).contains(&ndims) {
            return Err(Error::UnsupportedDimension(ndims));
        }
        if mesh.ndim() != ndims + 1 {
            return Err(Error::MeshRank {
                ndims,
                rank: mesh.ndim(),
            });
        }

        let (mut shape, points) = match_field!(&mesh; m => {
            let vectors = components_innermost(m, ndims)?;
            (
                m.shape()[1..].to_vec(),
                DataArray::with_options("points", vectors, DataArrayOptions::vectors())?,
            )
        });
        shape.reverse();

        Ok(StructuredGrid {
            mesh: Arc::new(mesh),
            ndims,
            shape,
            points,
            pointdata: Vec::new(),
            celldata: Vec::new(),
        })
    }

    /// A grid over the same mesh, with no attributes. The mesh and points are shared.
    pub fn copy(&self) -> Self {
        StructuredGrid {
            pointdata: Vec::new(),
            celldata: Vec::new(),
            ..self.clone()
        }
    }

    pub fn vtk_extension(&self) -> &'static str {
        "vts"
    }

    pub fn add_pointdata(&mut self, data: DataArray) {
        self.pointdata.push(data);
    }

    pub fn add_celldata(&mut self, data: DataArray) {
        self.celldata.push(data);
    }

    pub fn mesh(&self) -> &FieldData {
        &self.mesh
    }

    pub fn ndims(&self) -> usize {
        self.ndims
    }

    /// Points per axis, fastest varying axis first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of points in the grid.
    pub fn point_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Inclusive index ranges `[lo, hi]` for each of the three axes.
    ///
    /// Axes beyond `ndims` have a zero extent.
    pub fn extent(&self) -> [usize; 6] {
        let mut extent = [0; 6];
        for (axis, n) in self.shape.iter().enumerate() {
            extent[2 * axis + 1] = n.saturating_sub(1);
        }
        extent
    }

    pub fn points(&self) -> &DataArray {
        &self.points
    }

    pub fn pointdata(&self) -> &[DataArray] {
        &self.pointdata
    }

    pub fn celldata(&self) -> &[DataArray] {
        &self.celldata
    }

    /// Build a data array from a field laid out like the mesh.
    ///
    /// Point fields have the spatial shape `(n_0, ..., n_{ndims-1})` of the mesh and cell fields
    /// one less along each axis (at least 1). A field with one extra leading axis holds one
    /// component per index of that axis. The entities are flattened in the same order as the
    /// points.
    pub fn field_array(
        &self,
        name: impl Into<String>,
        field: impl Into<GridField>,
        centering: Centering,
    ) -> Result<DataArray, Error> {
        let name = name.into();
        let spatial = self.spatial_shape(centering);
        let check = |found: &[usize]| {
            if found == spatial.as_slice() {
                Ok(())
            } else {
                Err(Error::FieldShape {
                    name: name.clone(),
                    expected: spatial.clone(),
                    found: found.to_vec(),
                })
            }
        };

        match field.into() {
            GridField::Array(data) => {
                if data.ndim() == self.ndims {
                    check(data.shape())?;
                    let flat = match_field!(&data; arr => flatten(arr));
                    Ok(DataArray::new(name.clone(), flat)?)
                } else if data.ndim() == self.ndims + 1 {
                    check(&data.shape()[1..])?;
                    let ncomp = data.shape()[0];
                    let vectors: FieldData =
                        match_field!(&data; arr => components_innermost(arr, ncomp)?.into());
                    Ok(DataArray::with_options(
                        name.clone(),
                        vectors,
                        DataArrayOptions::vectors(),
                    )?)
                } else {
                    Err(Error::FieldShape {
                        name: name.clone(),
                        expected: spatial.clone(),
                        found: data.shape().to_vec(),
                    })
                }
            }
            GridField::Components(components) => {
                let mut flat = Vec::with_capacity(components.len());
                for comp in components.iter() {
                    check(comp.shape())?;
                    flat.push(match_field!(comp; arr => flatten(arr)));
                }
                Ok(DataArray::from_components(
                    name.clone(),
                    flat,
                    DataArrayOptions::default(),
                )?)
            }
        }
    }

    fn spatial_shape(&self, centering: Centering) -> Vec<usize> {
        let points = &self.mesh.shape()[1..];
        match centering {
            Centering::Point => points.to_vec(),
            Centering::Cell => points.iter().map(|&n| n.saturating_sub(1).max(1)).collect(),
        }
    }
}

/// Flatten an array into a rank 1 field in row-major order.
fn flatten<T: Scalar>(arr: &ArrayD<T>) -> FieldData {
    FieldData::from(arr.iter().copied().collect::<Vec<T>>())
}

/// Move the leading axis of `arr` innermost and reshape to `(entities, ncomp)`.
fn components_innermost<T: Scalar>(arr: &ArrayD<T>, ncomp: usize) -> Result<Array2<T>, Error> {
    let mut axes: Vec<usize> = (1..arr.ndim()).collect();
    axes.push(0);
    let moved = arr.view().permuted_axes(IxDyn(&axes));
    let entities = arr.shape()[1..].iter().product::<usize>();
    let flat: Vec<T> = moved.iter().copied().collect();
    Ok(Array2::from_shape_vec((entities, ncomp), flat)?)
}
