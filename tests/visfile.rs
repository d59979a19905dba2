use std::fs;
use std::path::PathBuf;

use ndarray::{Array, Array2, Array3};
use pretty_assertions::assert_eq;
use regex::Regex;
use visfile::*;

type Result = std::result::Result<(), Error>;

fn output_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("visfile_{}_{}.vts", name, std::process::id()))
}

/// A 2D grid of shape `(nx, ny)` with x = i and y = j.
fn mesh_2d(nx: usize, ny: usize) -> Array3<f64> {
    Array::from_shape_fn((2, nx, ny), |(c, i, j)| if c == 0 { i as f64 } else { j as f64 })
}

#[test]
fn structured_grid_scenario() -> Result {
    let grid = StructuredGrid::new(mesh_2d(10, 20))?;
    assert_eq!(grid.ndims(), 2);
    assert_eq!(grid.shape(), &[20, 10]);
    assert_eq!(grid.point_count(), 200);
    assert_eq!(grid.points().num_elem(), 200);
    assert_eq!(grid.points().components(), 3);

    let unpadded = DataArray::with_options(
        "points",
        Array2::<f64>::zeros((200, 2)),
        DataArrayOptions {
            vector_padding: 0,
            vector_format: VectorFormat::ListOfVectors,
        },
    )?;
    assert_eq!(unpadded.components(), 2);
    Ok(())
}

#[test]
fn write_with_fields() -> Result {
    let path = output_path("fields");
    let _ = fs::remove_file(&path);

    let pressure = Array2::from_shape_fn((4, 5), |(i, j)| (i * 5 + j) as f64);
    let velocity = Array3::<f32>::ones((2, 4, 5));
    let density = vec![
        FieldData::from(Array2::<f64>::zeros((3, 4))),
        FieldData::from(Array2::<f64>::ones((3, 4))),
    ];
    write_structured_grid(
        &path,
        mesh_2d(4, 5),
        vec![("pressure", pressure.into()), ("velocity", velocity.into())],
        vec![("density", density.into())],
        false,
    )?;

    let doc = fs::read_to_string(&path)?;
    fs::remove_file(&path)?;

    assert!(doc.starts_with(
        "<?xml version=\"1.0\"?>\n<VTKFile type=\"StructuredGrid\" version=\"0.1\" byte_order=\""
    ));
    assert!(doc.contains("<StructuredGrid WholeExtent=\"0 4 0 3 0 0\">\n<Piece Extent=\"0 4 0 3 0 0\">\n<PointData>\n"));

    let names = Regex::new(r#"Name="([^"]*)" NumberOfComponents="(\d+)""#).unwrap();
    let found: Vec<(String, String)> = names
        .captures_iter(&doc)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("pressure".to_string(), "1".to_string()),
            ("velocity".to_string(), "3".to_string()),
            ("density".to_string(), "3".to_string()),
            ("points".to_string(), "3".to_string()),
        ]
    );
    assert!(doc.contains("</PointData>\n<CellData>\n"));
    assert!(doc.ends_with("\n</AppendedData>\n</VTKFile>\n"));
    Ok(())
}

#[test]
fn refuses_to_overwrite() -> Result {
    let path = output_path("exists");
    fs::write(&path, "keep")?;

    let res = write_structured_grid(&path, mesh_2d(2, 2), vec![], vec![], false);
    assert!(matches!(res, Err(Error::FileExists(ref p)) if *p == path));
    assert_eq!(fs::read_to_string(&path)?, "keep");

    write_structured_grid(&path, mesh_2d(2, 2), vec![], vec![], true)?;
    let doc = fs::read_to_string(&path)?;
    fs::remove_file(&path)?;
    assert!(doc.contains("<StructuredGrid WholeExtent=\"0 1 0 1 0 0\">"));
    Ok(())
}

#[test]
fn mismatched_field_is_rejected() -> Result {
    let path = output_path("mismatch");
    let _ = fs::remove_file(&path);
    let res = write_structured_grid(
        &path,
        mesh_2d(4, 5),
        vec![("bad", Array2::<f64>::zeros((5, 4)).into())],
        vec![],
        false,
    );
    assert!(matches!(
        res,
        Err(Error::Grid(grid::Error::FieldShape { .. }))
    ));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn unsupported_dimension() {
    let path = output_path("dims");
    let res = write_structured_grid(
        &path,
        Array::<f64, _>::zeros((4, 2, 2, 2, 2)),
        vec![],
        vec![],
        true,
    );
    assert!(matches!(
        res,
        Err(Error::Grid(grid::Error::UnsupportedDimension(4)))
    ));
}
