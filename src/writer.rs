//!
//! Generators turning grids into XML VTK document trees.
//!
//! Three strategies are provided:
//!
//! - [`InlineGenerator`] embeds every data array in its `DataArray` element.
//! - [`AppendedGenerator`] writes placeholder elements with byte offsets into a single
//!   `AppendedData` trailer at the end of the file.
//! - [`ParallelGenerator`] writes a `.pvtu` index referencing per-piece files and carries no
//!   payload at all.
//!
//! Every generator is consumed by [`Generator::generate`], which wraps the generated grid in a
//! `VTKFile` envelope and returns the document root.
//!

use std::fmt;

use log::{debug, trace, warn};

use crate::buffer::{ByteOrder, Compressor};
use crate::grid::{StructuredGrid, UnstructuredGrid};
use crate::model::DataArray;
use crate::xml::{Element, Root};

/// Error produced by a generator or its configuration.
#[derive(Debug)]
pub enum Error {
    /// Only the known XML format revisions can be written.
    UnknownVersion(Version),
    /// The generator cannot write this kind of grid.
    UnsupportedGrid {
        generator: &'static str,
        grid: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownVersion(v) => write!(f, "Unknown VTK XML file version: {}", v),
            Error::UnsupportedGrid { generator, grid } => {
                write!(f, "The {} generator does not support {}", generator, grid)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Version number of the XML file format (e.g. `2.2 => Version { major: 2, minor: 2 }`).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// Format revisions understood by VTK readers.
    pub const KNOWN: [Version; 5] = [
        Version { major: 0, minor: 1 },
        Version { major: 1, minor: 0 },
        Version { major: 2, minor: 0 },
        Version { major: 2, minor: 1 },
        Version { major: 2, minor: 2 },
    ];

    pub fn new(pair: (u8, u8)) -> Self {
        Version {
            major: pair.0,
            minor: pair.1,
        }
    }

    pub fn is_known(self) -> bool {
        Version::KNOWN.contains(&self)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::new((0, 1))
    }
}

impl From<(u8, u8)> for Version {
    fn from(pair: (u8, u8)) -> Self {
        Version::new(pair)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Settings shared by all generators.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GeneratorConfig {
    compressor: Option<Compressor>,
    version: Version,
    byte_order: ByteOrder,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            compressor: None,
            version: Version::default(),
            byte_order: ByteOrder::native(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress payloads with `compressor`.
    ///
    /// If this build has no compression support, the request is dropped with a warning and
    /// payloads are written uncompressed.
    pub fn with_compressor(mut self, compressor: Option<Compressor>) -> Self {
        self.compressor = match compressor {
            Some(c) if !Compressor::is_available() => {
                warn!(
                    "The {} compressor is unavailable in this build, writing uncompressed data",
                    c
                );
                None
            }
            c => c,
        };
        self
    }

    /// Same as [`GeneratorConfig::with_compressor`] but takes the compressor by name.
    pub fn with_compressor_name(self, name: Option<&str>) -> Result<Self, crate::buffer::Error> {
        let compressor = name.map(str::parse::<Compressor>).transpose()?;
        Ok(self.with_compressor(compressor))
    }

    pub fn with_version(mut self, version: impl Into<Version>) -> Result<Self, Error> {
        let version = version.into();
        if !version.is_known() {
            return Err(Error::UnknownVersion(version));
        }
        self.version = version;
        Ok(self)
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn compressor(&self) -> Option<Compressor> {
        self.compressor
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

/// Anything a generator can be pointed at.
#[derive(Debug)]
pub enum VtkObject<'a> {
    UnstructuredGrid(&'a mut UnstructuredGrid),
    StructuredGrid(&'a mut StructuredGrid),
    DataArray(&'a mut DataArray),
}

impl<'a> From<&'a mut UnstructuredGrid> for VtkObject<'a> {
    fn from(grid: &'a mut UnstructuredGrid) -> Self {
        VtkObject::UnstructuredGrid(grid)
    }
}

impl<'a> From<&'a mut StructuredGrid> for VtkObject<'a> {
    fn from(grid: &'a mut StructuredGrid) -> Self {
        VtkObject::StructuredGrid(grid)
    }
}

impl<'a> From<&'a mut DataArray> for VtkObject<'a> {
    fn from(data: &'a mut DataArray) -> Self {
        VtkObject::DataArray(data)
    }
}

/// Build the `VTKFile` envelope for a document whose top element has tag `file_type`.
pub fn make_vtkfile(file_type: &str, config: &GeneratorConfig) -> Element {
    Element::new("VTKFile")
        .with_attr("type", file_type)
        .with_attr("version", config.version())
        .with_attr("byte_order", config.byte_order())
        .with_opt_attr("compressor", config.compressor().map(Compressor::vtk_name))
}

/// A strategy for turning grids and data arrays into elements.
///
/// Data arrays are mutable because generating them may change their cached encoding.
pub trait Generator: Sized {
    fn config(&self) -> &GeneratorConfig;

    fn gen_unstructured_grid(&mut self, grid: &mut UnstructuredGrid)
        -> Result<Element, crate::Error>;

    fn gen_structured_grid(&mut self, grid: &mut StructuredGrid) -> Result<Element, crate::Error>;

    fn gen_data_array(&mut self, data: &mut DataArray) -> Result<Element, crate::Error>;

    /// Dispatch on the kind of object.
    ///
    /// Used by [`generate`](Generator::generate). Calling it directly on an
    /// [`AppendedGenerator`] adds every generated array to the same trailer.
    #[doc(hidden)]
    fn rec<'a>(&mut self, obj: impl Into<VtkObject<'a>>) -> Result<Element, crate::Error> {
        match obj.into() {
            VtkObject::UnstructuredGrid(grid) => self.gen_unstructured_grid(grid),
            VtkObject::StructuredGrid(grid) => self.gen_structured_grid(grid),
            VtkObject::DataArray(data) => self.gen_data_array(data),
        }
    }

    /// Complete the envelope once the content has been generated.
    #[doc(hidden)]
    fn finish(self, vtk_file: Element) -> Root {
        Root::new(vtk_file)
    }

    /// Generate a complete document for `obj`.
    fn generate<'a>(mut self, obj: impl Into<VtkObject<'a>>) -> Result<Root, crate::Error> {
        let child = self.rec(obj)?;
        debug!("Generated {} document", child.tag());
        let mut vtk_file = make_vtkfile(child.tag(), self.config());
        vtk_file.add_child(child);
        Ok(self.finish(vtk_file))
    }
}

/// Append `PointData` and `CellData` blocks to `piece` for non-empty collections.
fn gen_attributes<G: Generator>(
    gen: &mut G,
    piece: &mut Element,
    pointdata: &mut [DataArray],
    celldata: &mut [DataArray],
) -> Result<(), crate::Error> {
    for (tag, arrays) in [("PointData", pointdata), ("CellData", celldata)] {
        if arrays.is_empty() {
            continue;
        }
        let mut block = Element::new(tag);
        for data in arrays.iter_mut() {
            block.add_child(gen.rec(data)?);
        }
        piece.add_child(block);
    }
    Ok(())
}

fn gen_unstructured_grid_tree<G: Generator>(
    gen: &mut G,
    grid: &mut UnstructuredGrid,
) -> Result<Element, crate::Error> {
    let mut piece = Element::new("Piece")
        .with_attr("NumberOfPoints", grid.point_count)
        .with_attr("NumberOfCells", grid.cell_count);

    gen_attributes(gen, &mut piece, &mut grid.pointdata, &mut grid.celldata)?;

    let mut points = Element::new("Points");
    points.add_child(gen.rec(&mut grid.points)?);
    piece.add_child(points);

    let mut cells = Element::new("Cells");
    cells.add_child(gen.rec(&mut grid.cell_connectivity)?);
    cells.add_child(gen.rec(&mut grid.cell_offsets)?);
    cells.add_child(gen.rec(&mut grid.cell_types)?);
    piece.add_child(cells);

    let mut el = Element::new("UnstructuredGrid");
    el.add_child(piece);
    Ok(el)
}

/// Extent attribute value: `"lo hi"` for each of the three axes.
fn extent_string(grid: &StructuredGrid) -> String {
    grid.extent()
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn gen_structured_grid_tree<G: Generator>(
    gen: &mut G,
    grid: &mut StructuredGrid,
) -> Result<Element, crate::Error> {
    let extent = extent_string(grid);
    let mut piece = Element::new("Piece").with_attr("Extent", &extent);

    gen_attributes(gen, &mut piece, &mut grid.pointdata, &mut grid.celldata)?;

    let mut points = Element::new("Points");
    points.add_child(gen.rec(&mut grid.points)?);
    piece.add_child(points);

    let mut el = Element::new("StructuredGrid").with_attr("WholeExtent", &extent);
    el.add_child(piece);
    Ok(el)
}

fn data_array_element(data: &DataArray, format: &str) -> Element {
    Element::new("DataArray")
        .with_attr("type", data.scalar_type())
        .with_attr("Name", data.name())
        .with_attr("NumberOfComponents", data.components())
        .with_attr("format", format)
}

/// Embeds each data array's payload directly in its element.
#[derive(Clone, Debug, Default)]
pub struct InlineGenerator {
    config: GeneratorConfig,
}

impl InlineGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        InlineGenerator { config }
    }
}

impl Generator for InlineGenerator {
    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn gen_unstructured_grid(
        &mut self,
        grid: &mut UnstructuredGrid,
    ) -> Result<Element, crate::Error> {
        gen_unstructured_grid_tree(self, grid)
    }

    fn gen_structured_grid(&mut self, grid: &mut StructuredGrid) -> Result<Element, crate::Error> {
        gen_structured_grid_tree(self, grid)
    }

    fn gen_data_array(&mut self, data: &mut DataArray) -> Result<Element, crate::Error> {
        let mut el = data_array_element(data, "binary");
        data.encode_with_byte_order(self.config.compressor, self.config.byte_order, &mut el)?;
        el.add_child("\n");
        Ok(el)
    }
}

/// Collects all payloads into one `AppendedData` trailer.
///
/// Each data array element records the character offset of its payload within the trailer,
/// counted from just after the leading `_` marker.
#[derive(Debug)]
pub struct AppendedGenerator {
    config: GeneratorConfig,
    offset: usize,
    appended: Element,
}

impl Default for AppendedGenerator {
    fn default() -> Self {
        AppendedGenerator::new(GeneratorConfig::default())
    }
}

impl AppendedGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let mut appended = Element::new("AppendedData").with_attr("encoding", "base64");
        appended.add_child("_");
        AppendedGenerator {
            config,
            offset: 0,
            appended,
        }
    }

    /// Number of payload characters appended so far.
    pub fn appended_len(&self) -> usize {
        self.offset
    }
}

impl Generator for AppendedGenerator {
    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn gen_unstructured_grid(
        &mut self,
        grid: &mut UnstructuredGrid,
    ) -> Result<Element, crate::Error> {
        gen_unstructured_grid_tree(self, grid)
    }

    fn gen_structured_grid(&mut self, grid: &mut StructuredGrid) -> Result<Element, crate::Error> {
        gen_structured_grid_tree(self, grid)
    }

    fn gen_data_array(&mut self, data: &mut DataArray) -> Result<Element, crate::Error> {
        let el = data_array_element(data, "appended").with_attr("offset", self.offset);
        let len = data.encode_with_byte_order(
            self.config.compressor,
            self.config.byte_order,
            &mut self.appended,
        )?;
        trace!(
            "Appended \"{}\" at offset {} ({} characters)",
            data.name(),
            self.offset,
            len
        );
        self.offset += len;
        Ok(el)
    }

    fn finish(mut self, mut vtk_file: Element) -> Root {
        self.appended.add_child("\n");
        vtk_file.add_child(self.appended);
        Root::new(vtk_file)
    }
}

/// Writes a parallel unstructured grid index referencing one file per piece.
///
/// Only array metadata is written, so payloads are never encoded and compression never applies.
#[derive(Clone, Debug)]
pub struct ParallelGenerator {
    config: GeneratorConfig,
    pathnames: Vec<String>,
}

impl ParallelGenerator {
    pub fn new<I, S>(pathnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParallelGenerator {
            config: GeneratorConfig::default(),
            pathnames: pathnames.into_iter().map(Into::into).collect(),
        }
    }

    /// Use the given format version and byte order. Any compressor in `config` is ignored.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config.with_compressor(None);
        self
    }

    pub fn pathnames(&self) -> &[String] {
        &self.pathnames
    }

    /// Extension of files written by this generator.
    pub fn vtk_extension(&self) -> &'static str {
        "pvtu"
    }
}

impl Generator for ParallelGenerator {
    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn gen_unstructured_grid(
        &mut self,
        grid: &mut UnstructuredGrid,
    ) -> Result<Element, crate::Error> {
        let mut el = Element::new("PUnstructuredGrid");

        let mut pointdata = Element::new("PPointData");
        for data in grid.pointdata.iter_mut() {
            pointdata.add_child(self.rec(data)?);
        }
        el.add_child(pointdata);

        if !grid.celldata.is_empty() {
            let mut celldata = Element::new("PCellData");
            for data in grid.celldata.iter_mut() {
                celldata.add_child(self.rec(data)?);
            }
            el.add_child(celldata);
        }

        let mut points = Element::new("PPoints");
        points.add_child(self.rec(&mut grid.points)?);
        el.add_child(points);

        let mut cells = Element::new("PCells");
        cells.add_child(self.rec(&mut grid.cell_connectivity)?);
        cells.add_child(self.rec(&mut grid.cell_offsets)?);
        cells.add_child(self.rec(&mut grid.cell_types)?);
        el.add_child(cells);

        for pathname in self.pathnames.iter() {
            el.add_child(Element::new("Piece").with_attr("Source", pathname));
        }

        Ok(el)
    }

    fn gen_structured_grid(&mut self, _grid: &mut StructuredGrid) -> Result<Element, crate::Error> {
        Err(Error::UnsupportedGrid {
            generator: "parallel",
            grid: "structured grids",
        }
        .into())
    }

    fn gen_data_array(&mut self, data: &mut DataArray) -> Result<Element, crate::Error> {
        Ok(Element::new("PDataArray")
            .with_attr("type", data.scalar_type())
            .with_attr("Name", data.name())
            .with_attr("NumberOfComponents", data.components()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellType, Cells};
    use crate::xml::Node;
    use ndarray::{Array2, Array3};
    use pretty_assertions::assert_eq;

    fn triangle() -> Result<UnstructuredGrid, crate::Error> {
        let points = DataArray::new("points", Array2::<f32>::zeros((3, 3)))?;
        Ok(UnstructuredGrid::new(
            (3, points),
            Cells::Uniform(vec![0i32, 1, 2].into()),
            &[CellType::Triangle],
        )?)
    }

    fn children_tags(el: &Element) -> Vec<&str> {
        el.child_elements().map(Element::tag).collect()
    }

    #[test]
    fn version_validation() {
        assert_eq!(Version::default().to_string(), "0.1");
        assert!(GeneratorConfig::new().with_version((2, 2)).is_ok());
        assert!(matches!(
            GeneratorConfig::new().with_version((3, 0)),
            Err(Error::UnknownVersion(Version { major: 3, minor: 0 }))
        ));
    }

    #[test]
    fn compressor_by_name() -> Result<(), crate::buffer::Error> {
        let config = GeneratorConfig::new().with_compressor_name(None)?;
        assert_eq!(config.compressor(), None);
        assert!(GeneratorConfig::new()
            .with_compressor_name(Some("snappy"))
            .is_err());
        Ok(())
    }

    #[cfg(feature = "compression")]
    #[test]
    fn envelope_names_compressor() -> Result<(), crate::Error> {
        let config = GeneratorConfig::new()
            .with_compressor(Some(Compressor::ZLib))
            .with_byte_order(ByteOrder::BigEndian)
            .with_version((1, 0))?;
        let el = make_vtkfile("UnstructuredGrid", &config);
        assert_eq!(
            el.to_string(),
            "<VTKFile type=\"UnstructuredGrid\" version=\"1.0\" byte_order=\"BigEndian\" compressor=\"vtkZLibDataCompressor\"/>\n"
        );
        Ok(())
    }

    #[test]
    fn inline_unstructured_layout() -> Result<(), crate::Error> {
        let mut grid = triangle()?;
        grid.add_pointdata(DataArray::new("p", vec![1.0f64, 2.0, 3.0])?);
        let root = InlineGenerator::default().generate(&mut grid)?;

        let file = root.file_element().unwrap();
        assert_eq!(file.tag(), "VTKFile");
        assert_eq!(file.attr("type"), Some("UnstructuredGrid"));
        assert_eq!(file.attr("compressor"), None);

        let ugrid = file.child_elements().next().unwrap();
        let piece = ugrid.child_elements().next().unwrap();
        assert_eq!(piece.attr("NumberOfPoints"), Some("3"));
        assert_eq!(piece.attr("NumberOfCells"), Some("1"));
        assert_eq!(children_tags(piece), vec!["PointData", "Points", "Cells"]);

        let cells = piece.child_elements().nth(2).unwrap();
        let names: Vec<_> = cells.child_elements().filter_map(|e| e.attr("Name")).collect();
        assert_eq!(names, vec!["connectivity", "offsets", "types"]);

        let types = cells.child_elements().nth(2).unwrap();
        assert_eq!(types.attr("type"), Some("UInt8"));
        assert_eq!(types.attr("format"), Some("binary"));
        assert_eq!(types.children().len(), 3);
        assert_eq!(types.children()[2], Node::from("\n"));
        Ok(())
    }

    #[test]
    fn structured_extent() -> Result<(), crate::Error> {
        let mut grid = StructuredGrid::new(Array3::<f64>::zeros((2, 10, 20)))?;
        let root = InlineGenerator::default().generate(&mut grid)?;
        let file = root.file_element().unwrap();
        let sgrid = file.child_elements().next().unwrap();
        assert_eq!(sgrid.tag(), "StructuredGrid");
        assert_eq!(sgrid.attr("WholeExtent"), Some("0 19 0 9 0 0"));
        let piece = sgrid.child_elements().next().unwrap();
        assert_eq!(piece.attr("Extent"), Some("0 19 0 9 0 0"));
        assert_eq!(children_tags(piece), vec!["Points"]);
        Ok(())
    }

    #[test]
    fn appended_offsets_accumulate() -> Result<(), crate::Error> {
        let mut grid = triangle()?;
        let mut gen = AppendedGenerator::default();
        let el = gen.rec(&mut grid)?;
        let total = gen.appended_len();

        let piece = el.child_elements().next().unwrap();
        let mut offsets = Vec::new();
        for block in piece.child_elements() {
            for data in block.child_elements() {
                assert_eq!(data.attr("format"), Some("appended"));
                assert!(data.children().is_empty());
                offsets.push(data.attr("offset").unwrap_or("").parse::<usize>().unwrap());
            }
        }
        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0], 0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert!(offsets[3] < total);

        let root = gen.finish(make_vtkfile(el.tag(), &GeneratorConfig::default()));
        let file = root.file_element().unwrap();
        let trailer = file.child_elements().last().unwrap();
        assert_eq!(trailer.tag(), "AppendedData");
        assert_eq!(trailer.attr("encoding"), Some("base64"));
        // "_", two text nodes per array, then the final newline.
        assert_eq!(trailer.children().len(), 1 + 2 * 4 + 1);
        assert_eq!(trailer.children()[0], Node::from("_"));
        Ok(())
    }

    #[test]
    fn each_document_starts_a_new_trailer() -> Result<(), crate::Error> {
        let mut grid = triangle()?;
        let first = AppendedGenerator::default().generate(&mut grid)?.to_string();
        let second = AppendedGenerator::default().generate(&mut grid)?.to_string();
        assert_eq!(first, second);
        assert_eq!(first.matches(" offset=\"0\"").count(), 1);
        Ok(())
    }

    #[test]
    fn parallel_index() -> Result<(), crate::Error> {
        let mut grid = triangle()?;
        grid.add_celldata(DataArray::new("c", vec![1i32])?);
        let gen = ParallelGenerator::new(vec!["a.vtu", "b.vtu"]);
        assert_eq!(gen.vtk_extension(), "pvtu");
        let root = gen.generate(&mut grid)?;

        let file = root.file_element().unwrap();
        assert_eq!(file.attr("type"), Some("PUnstructuredGrid"));
        let pgrid = file.child_elements().next().unwrap();
        assert_eq!(
            children_tags(pgrid),
            vec!["PPointData", "PCellData", "PPoints", "PCells", "Piece", "Piece"]
        );
        let sources: Vec<_> = pgrid.child_elements().filter_map(|e| e.attr("Source")).collect();
        assert_eq!(sources, vec!["a.vtu", "b.vtu"]);
        Ok(())
    }

    #[test]
    fn parallel_rejects_structured_grids() -> Result<(), crate::Error> {
        let mut grid = StructuredGrid::new(Array2::<f64>::zeros((1, 4)))?;
        let res = ParallelGenerator::new(Vec::<String>::new()).generate(&mut grid);
        assert!(matches!(
            res,
            Err(crate::Error::Writer(Error::UnsupportedGrid { .. }))
        ));
        Ok(())
    }
}
