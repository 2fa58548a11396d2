//! Snapshot output as VTK files.

use crate::{
  error::SolveError,
  mesh::CartesianMesh,
  space::{DgSpace, VectorField},
};

use vtkio::{
  model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, ElementType,
    UnstructuredGridPiece, Version, VertexNumbers, Vtk,
  },
  IOBuffer,
};

use std::{
  fs,
  path::{Path, PathBuf},
};

/// Unstructured grid of quads with a point vector attribute.
///
/// Every cell gets its own four vertices, so the discontinuous field is kept as is.
pub fn field_to_vtk(space: &DgSpace, field: &VectorField, name: &str) -> Vtk {
  let mesh = space.mesh();
  let ncells = mesh.ncells();

  let points: Vec<f64> = (0..ncells)
    .flat_map(|icell| mesh.cell_vertices(icell))
    .flat_map(|ivertex| {
      let x = mesh.vertex_coord(ivertex);
      [x.x, x.y, 0.0]
    })
    .collect();

  let values: Vec<f64> = space
    .cell_vertex_values(field)
    .into_iter()
    .flatten()
    .flat_map(|b| [b.x, b.y, 0.0])
    .collect();

  let vertices = (0..ncells as u32)
    .flat_map(|icell| [4, 4 * icell, 4 * icell + 1, 4 * icell + 2, 4 * icell + 3])
    .collect();
  let cells = Cells {
    cell_verts: VertexNumbers::Legacy {
      num_cells: ncells as u32,
      vertices,
    },
    types: vec![CellType::Quad; ncells],
  };

  let data = Attributes {
    point: vec![Attribute::DataArray(DataArray {
      name: name.to_string(),
      elem: ElementType::Vectors,
      data: IOBuffer::new(values),
    })],
    cell: Vec::new(),
  };

  let grid = UnstructuredGridPiece {
    points: IOBuffer::new(points),
    cells,
    data,
  };

  Vtk {
    version: Version::new((4, 2)),
    title: String::from("Induction VTK Export"),
    byte_order: ByteOrder::native(),
    data: grid.into(),
    file_path: None,
  }
}

/// Continuous scalar field given by its values on the mesh vertices.
pub fn nodal_to_vtk(mesh: &CartesianMesh, values: &na::DVector<f64>, name: &str) -> Vtk {
  assert_eq!(values.len(), mesh.nvertices(), "One value per vertex expected.");
  let ncells = mesh.ncells();

  let points: Vec<f64> = (0..mesh.nvertices())
    .flat_map(|ivertex| {
      let x = mesh.vertex_coord(ivertex);
      [x.x, x.y, 0.0]
    })
    .collect();

  let vertices = (0..ncells)
    .flat_map(|icell| {
      let [v0, v1, v2, v3] = mesh.cell_vertices(icell).map(|v| v as u32);
      [4, v0, v1, v2, v3]
    })
    .collect();
  let cells = Cells {
    cell_verts: VertexNumbers::Legacy {
      num_cells: ncells as u32,
      vertices,
    },
    types: vec![CellType::Quad; ncells],
  };

  let data = Attributes {
    point: vec![Attribute::DataArray(DataArray {
      name: name.to_string(),
      elem: ElementType::Scalars {
        num_comp: 1,
        lookup_table: None,
      },
      data: IOBuffer::new(values.as_slice().to_vec()),
    })],
    cell: Vec::new(),
  };

  let grid = UnstructuredGridPiece {
    points: IOBuffer::new(points),
    cells,
    data,
  };

  Vtk {
    version: Version::new((4, 2)),
    title: String::from("Induction VTK Export"),
    byte_order: ByteOrder::native(),
    data: grid.into(),
    file_path: None,
  }
}

/// Time series of VTK files tied together by a `.pvd` collection.
///
/// The collection is rewritten after every append,
/// so an aborted run still leaves a readable series.
#[derive(Debug)]
pub struct VtkSeries {
  dir: PathBuf,
  stem: String,
  entries: Vec<(f64, String)>,
}
impl VtkSeries {
  pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Result<Self, SolveError> {
    let dir = dir.into();
    fs::create_dir_all(&dir)?;
    Ok(Self {
      dir,
      stem: stem.into(),
      entries: Vec::new(),
    })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }
  pub fn len(&self) -> usize {
    self.entries.len()
  }
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
  pub fn collection_path(&self) -> PathBuf {
    self.dir.join(format!("{}.pvd", self.stem))
  }

  pub fn append(&mut self, time: f64, vtk: Vtk) -> Result<(), SolveError> {
    let file_name = format!("{}_{:06}.vtk", self.stem, self.entries.len());
    vtk
      .export_ascii(self.dir.join(&file_name))
      .map_err(SolveError::Vtk)?;
    self.entries.push((time, file_name));
    self.write_collection()
  }

  fn write_collection(&self) -> Result<(), SolveError> {
    let datasets: String = self
      .entries
      .iter()
      .map(|(time, file)| {
        format!("    <DataSet timestep=\"{time:e}\" part=\"0\" file=\"{file}\"/>\n")
      })
      .collect();
    let xml = format!(
      "<?xml version=\"1.0\"?>\n\
       <VTKFile type=\"Collection\" version=\"0.1\">\n  \
       <Collection>\n{datasets}  </Collection>\n\
       </VTKFile>\n"
    );
    fs::write(self.collection_path(), xml)?;
    Ok(())
  }
}

/// Sink for the fields produced during a run.
pub trait RunOutput {
  fn snapshot(&mut self, space: &DgSpace, time: f64, field: &VectorField)
    -> Result<(), SolveError>;
  /// Pointwise error $B_h - Pi B$ at the final time.
  fn error_field(&mut self, space: &DgSpace, error: &VectorField) -> Result<(), SolveError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;
impl RunOutput for NullOutput {
  fn snapshot(&mut self, _: &DgSpace, _: f64, _: &VectorField) -> Result<(), SolveError> {
    Ok(())
  }
  fn error_field(&mut self, _: &DgSpace, _: &VectorField) -> Result<(), SolveError> {
    Ok(())
  }
}

/// Writes `sol.pvd` with one `.vtk` file per snapshot and `error.vtk`.
#[derive(Debug)]
pub struct VtkOutput {
  series: VtkSeries,
}
impl VtkOutput {
  pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SolveError> {
    Ok(Self {
      series: VtkSeries::new(dir, "sol")?,
    })
  }
  pub fn series(&self) -> &VtkSeries {
    &self.series
  }
}
impl RunOutput for VtkOutput {
  fn snapshot(
    &mut self,
    space: &DgSpace,
    time: f64,
    field: &VectorField,
  ) -> Result<(), SolveError> {
    self.series.append(time, field_to_vtk(space, field, "B"))
  }

  fn error_field(&mut self, space: &DgSpace, error: &VectorField) -> Result<(), SolveError> {
    let path = self.series.dir().join("error.vtk");
    tracing::info!("writing error field to {}", path.display());
    field_to_vtk(space, error, "Berr")
      .export_ascii(path)
      .map_err(SolveError::Vtk)
  }
}
