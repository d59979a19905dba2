//! Writer for XML VTK grid files.
//!
//! Grids are assembled from `ndarray` arrays, turned into a document tree by one of the
//! [`Generator`](writer::Generator)s in [`writer`], and serialized with
//! [`Root::write`](xml::Root::write).
//!
//! # Examples
//!
//! Write a cloud of points as an unstructured grid of vertex cells:
//!
//! ```no_run
//! use ndarray::Array2;
//! use visfile::grid::{CellType, Cells, UnstructuredGrid};
//! use visfile::model::DataArray;
//! use visfile::writer::{AppendedGenerator, Generator};
//!
//! # fn main() -> Result<(), visfile::Error> {
//! let n = 100;
//! let points = DataArray::new("points", Array2::<f64>::zeros((3, n)))?;
//! let conn: Vec<u32> = (0..n as u32).collect();
//! let mut grid = UnstructuredGrid::new(
//!     (n, points),
//!     Cells::Uniform(conn.into()),
//!     &vec![CellType::Vertex; n],
//! )?;
//! grid.add_pointdata(DataArray::new("pressure", vec![1.0f64; n])?);
//!
//! let root = AppendedGenerator::default().generate(&mut grid)?;
//! let mut file = std::fs::File::create("points.vtu")?;
//! root.write(&mut file)?;
//! # Ok(())
//! # }
//! ```
//!
//! Structured grids can be written in one call with [`write_structured_grid`].

#[macro_use]
mod macros;

pub mod buffer;
pub mod grid;
pub mod model;
pub mod sink;
pub mod writer;
pub mod xml;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

pub use buffer::{ByteOrder, Compressor, EncodedBuffer, Encoder};
pub use grid::{CellType, Cells, Centering, GridField, StructuredGrid, UnstructuredGrid};
pub use model::{DataArray, DataArrayOptions, FieldData, ScalarType, VectorFormat};
pub use writer::{
    AppendedGenerator, Generator, GeneratorConfig, InlineGenerator, ParallelGenerator, Version,
};

/// Error type for all writing operations.
#[derive(Debug)]
pub enum Error {
    IO(io::Error),
    Encoding(buffer::Error),
    Array(model::Error),
    Grid(grid::Error),
    Writer(writer::Error),
    /// The output file exists and overwriting was not requested.
    FileExists(PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IO(source) => write!(f, "IO error: {}", source),
            Error::Encoding(source) => write!(f, "Encoding error: {}", source),
            Error::Array(source) => write!(f, "Data array error: {}", source),
            Error::Grid(source) => write!(f, "Grid error: {}", source),
            Error::Writer(source) => write!(f, "Write error: {}", source),
            Error::FileExists(path) => {
                write!(f, "Output file {} already exists", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(source) => Some(source),
            Error::Encoding(source) => Some(source),
            Error::Array(source) => Some(source),
            Error::Grid(source) => Some(source),
            Error::Writer(source) => Some(source),
            Error::FileExists(_) => None,
        }
    }
}

/// Convert `std::io` error into `visfile` error.
impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<buffer::Error> for Error {
    fn from(e: buffer::Error) -> Error {
        Error::Encoding(e)
    }
}

impl From<model::Error> for Error {
    fn from(e: model::Error) -> Error {
        Error::Array(e)
    }
}

impl From<grid::Error> for Error {
    fn from(e: grid::Error) -> Error {
        Error::Grid(e)
    }
}

impl From<writer::Error> for Error {
    fn from(e: writer::Error) -> Error {
        Error::Writer(e)
    }
}

/// Convert `visfile` error into `std::io` error.
impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::IO(e) => e,
            _ => io::Error::new(io::ErrorKind::Other, err.to_string()),
        }
    }
}

/// Write a structured grid with its fields to a `.vts` file using appended data.
///
/// `mesh` has shape `(ndims, n_0, ..., n_{ndims-1})`. Each field is either an array shaped like
/// the grid, optionally with a leading component axis, or a list of such arrays, one per
/// component. Point fields have the spatial shape of the mesh and cell fields one less along
/// each axis.
///
/// Point fields are written as `PointData` and cell fields as `CellData`, so each cell field
/// is stored with the cells it describes rather than alongside the points.
///
/// An existing file at `file_path` is only replaced if `overwrite` is `true`.
///
/// # Examples
///
/// ```no_run
/// use ndarray::{Array2, Array3};
/// use visfile::{write_structured_grid, GridField};
///
/// # fn main() -> Result<(), visfile::Error> {
/// let mesh = Array3::<f64>::zeros((2, 10, 20));
/// let pressure: GridField = Array2::<f64>::ones((10, 20)).into();
/// write_structured_grid("grid.vts", mesh, vec![("pressure", pressure)], vec![], true)?;
/// # Ok(())
/// # }
/// ```
pub fn write_structured_grid(
    file_path: impl AsRef<Path>,
    mesh: impl Into<FieldData>,
    point_data: Vec<(&str, GridField)>,
    cell_data: Vec<(&str, GridField)>,
    overwrite: bool,
) -> Result<(), Error> {
    let file_path = file_path.as_ref();
    if file_path.exists() && !overwrite {
        return Err(Error::FileExists(file_path.to_path_buf()));
    }

    let mut grid = StructuredGrid::new(mesh)?;
    for (name, field) in point_data {
        let data = grid.field_array(name, field, Centering::Point)?;
        grid.add_pointdata(data);
    }
    for (name, field) in cell_data {
        let data = grid.field_array(name, field, Centering::Cell)?;
        grid.add_celldata(data);
    }

    let root = AppendedGenerator::default().generate(&mut grid)?;

    debug!("Writing structured grid to {}", file_path.display());
    let mut writer = BufWriter::new(File::create(file_path)?);
    root.write(&mut writer)?;
    writer.flush()?;
    Ok(())
}
