//!
//! Export of structured grids to legacy binary mesh databases.
//!
//! No database backend is bundled. Implement [`LegacyDatabase`] on top of a binding to the
//! desired library and pass it to [`export_structured_grid`].
//!

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::grid::{Centering, StructuredGrid};

/// How an existing database file is treated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Create a new database, replacing any existing file.
    Create,
    /// Open an existing database for appending.
    Append,
}

/// Value of a backend specific option.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Backend specific options, passed through untouched.
pub type DbOptions = BTreeMap<String, OptionValue>;

/// Minimal capability interface of a legacy mesh database.
pub trait LegacyDatabase {
    type Handle;
    type Error: From<crate::Error>;

    fn create_or_open(
        &mut self,
        path: &Path,
        mode: OpenMode,
        options: &DbOptions,
    ) -> Result<Self::Handle, Self::Error>;

    /// Store a curvilinear mesh as one coordinate array per axis over `dims` points.
    fn put_mesh(
        &mut self,
        handle: &mut Self::Handle,
        name: &str,
        coordinates: &[Vec<f64>],
        dims: &[usize],
        options: &DbOptions,
    ) -> Result<(), Self::Error>;

    /// Store a variable defined on `mesh_name` as one array per component.
    fn put_variable(
        &mut self,
        handle: &mut Self::Handle,
        name: &str,
        mesh_name: &str,
        components: &[Vec<f64>],
        centering: Centering,
        options: &DbOptions,
    ) -> Result<(), Self::Error>;

    fn close(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;
}

/// Write `grid` and all of its attributes into a new database at `path`.
pub fn export_structured_grid<D: LegacyDatabase>(
    db: &mut D,
    path: impl AsRef<Path>,
    mesh_name: &str,
    grid: &StructuredGrid,
    options: &DbOptions,
) -> Result<(), D::Error> {
    let path = path.as_ref();
    debug!("Exporting structured grid \"{}\" to {}", mesh_name, path.display());

    let mut handle = db.create_or_open(path, OpenMode::Create, options)?;

    let mut coordinates = grid
        .points()
        .components_f64()
        .map_err(crate::Error::from)?;
    coordinates.truncate(grid.ndims());
    db.put_mesh(&mut handle, mesh_name, &coordinates, grid.shape(), options)?;

    let fields = grid
        .pointdata()
        .iter()
        .map(|data| (data, Centering::Point))
        .chain(grid.celldata().iter().map(|data| (data, Centering::Cell)));
    for (data, centering) in fields {
        let components = data.components_f64().map_err(crate::Error::from)?;
        db.put_variable(
            &mut handle,
            data.name(),
            mesh_name,
            &components,
            centering,
            options,
        )?;
    }

    db.close(handle)
}
