//! Structured Cartesian meshes of a rectangle.

use crate::{Point, Vector2};

pub type CellIdx = usize;
pub type VertexIdx = usize;

/// converts linear cell index to cartesian index
///
/// converts linear index in 0..n^2 to cartesian index in (0,0)..(n,n)
pub fn linear_index2cartesian_index(lin_idx: usize, dim_len: usize) -> [usize; 2] {
  [lin_idx % dim_len, lin_idx / dim_len]
}

/// converts cartesian index to linear index
pub fn cartesian_index2linear_index(cart_idx: [usize; 2], dim_len: usize) -> usize {
  cart_idx[0] + dim_len * cart_idx[1]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
  min: Point,
  max: Point,
}
impl Rect {
  pub fn new_min_max(min: Point, max: Point) -> Self {
    assert!(min.x < max.x && min.y < max.y, "Degenerate rectangle.");
    Self { min, max }
  }
  pub fn new_unit_square() -> Self {
    Self::new_min_max(Point::new(0.0, 0.0), Point::new(1.0, 1.0))
  }
  /// The square $[-1,1]^2$.
  pub fn new_symmetric_square() -> Self {
    Self::new_min_max(Point::new(-1.0, -1.0), Point::new(1.0, 1.0))
  }

  pub fn min(&self) -> &Point {
    &self.min
  }
  pub fn max(&self) -> &Point {
    &self.max
  }
  pub fn side_lengths(&self) -> Vector2 {
    self.max - self.min
  }
}

/// One of the four edges of a quadrilateral cell.
///
/// The reference cell is $[-1,1]^2$ with coordinates $(xi, eta)$.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalFacet {
  Left,
  Right,
  Bottom,
  Top,
}
impl LocalFacet {
  pub const ALL: [LocalFacet; 4] = [Self::Left, Self::Right, Self::Bottom, Self::Top];

  pub fn index(self) -> usize {
    self as usize
  }

  /// Outward unit normal.
  pub fn normal(self) -> Vector2 {
    match self {
      Self::Left => Vector2::new(-1.0, 0.0),
      Self::Right => Vector2::new(1.0, 0.0),
      Self::Bottom => Vector2::new(0.0, -1.0),
      Self::Top => Vector2::new(0.0, 1.0),
    }
  }

  /// Maps the facet parameter $s in [-1,1]$ to reference cell coordinates.
  ///
  /// The parameter always runs in positive $x$ or $y$ direction,
  /// so both cells sharing an edge see the same point for the same $s$.
  pub fn ref_coord(self, s: f64) -> [f64; 2] {
    match self {
      Self::Left => [-1.0, s],
      Self::Right => [1.0, s],
      Self::Bottom => [s, -1.0],
      Self::Top => [s, 1.0],
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct CellGeometry {
  pub idx: CellIdx,
  /// lower-left corner
  pub min: Point,
  pub hx: f64,
  pub hy: f64,
}
impl CellGeometry {
  pub fn vol(&self) -> f64 {
    self.hx * self.hy
  }
  /// Determinant of the affine map from the reference cell.
  pub fn det_jacobian(&self) -> f64 {
    0.25 * self.vol()
  }
  pub fn center(&self) -> Point {
    self.min + 0.5 * Vector2::new(self.hx, self.hy)
  }
  pub fn ref2phys(&self, xi: [f64; 2]) -> Point {
    self.center() + 0.5 * Vector2::new(self.hx * xi[0], self.hy * xi[1])
  }
  /// Scaling of reference derivatives to physical ones.
  pub fn grad_scale(&self) -> Vector2 {
    Vector2::new(2.0 / self.hx, 2.0 / self.hy)
  }
  pub fn facet_length(&self, facet: LocalFacet) -> f64 {
    match facet {
      LocalFacet::Left | LocalFacet::Right => self.hy,
      LocalFacet::Bottom | LocalFacet::Top => self.hx,
    }
  }
}

/// Edge shared by two cells.
///
/// The `plus` cell is the left cell of a vertical edge and the lower cell of a
/// horizontal edge, `normal` is the outward normal of the `plus` cell.
#[derive(Debug, Clone, Copy)]
pub struct InteriorFacet {
  pub plus: CellIdx,
  pub minus: CellIdx,
  pub plus_facet: LocalFacet,
  pub minus_facet: LocalFacet,
  pub normal: Vector2,
}

#[derive(Debug, Clone, Copy)]
pub struct BoundaryFacet {
  pub cell: CellIdx,
  pub facet: LocalFacet,
  pub normal: Vector2,
}

#[derive(Debug, Clone)]
pub struct CartesianMesh {
  rect: Rect,
  ncells_axis: usize,
}
// constructors
impl CartesianMesh {
  pub fn new(rect: Rect, ncells_axis: usize) -> Self {
    assert!(ncells_axis > 0, "Mesh needs at least one cell per axis.");
    Self { rect, ncells_axis }
  }
  pub fn new_unit(ncells_axis: usize) -> Self {
    Self::new(Rect::new_unit_square(), ncells_axis)
  }
}
// getters
impl CartesianMesh {
  pub fn rect(&self) -> &Rect {
    &self.rect
  }
  pub fn ncells_axis(&self) -> usize {
    self.ncells_axis
  }
  pub fn nvertices_axis(&self) -> usize {
    self.ncells_axis + 1
  }
  pub fn ncells(&self) -> usize {
    self.ncells_axis.pow(2)
  }
  pub fn nvertices(&self) -> usize {
    self.nvertices_axis().pow(2)
  }
  pub fn cell_extents(&self) -> Vector2 {
    self.rect.side_lengths() / self.ncells_axis as f64
  }
  /// Uniform cell size $h$.
  pub fn mesh_width(&self) -> f64 {
    self.cell_extents().max()
  }
}
// topology and geometry
impl CartesianMesh {
  pub fn cell(&self, icell: CellIdx) -> CellGeometry {
    let [ix, iy] = linear_index2cartesian_index(icell, self.ncells_axis);
    let h = self.cell_extents();
    let min = self.rect.min() + Vector2::new(ix as f64 * h.x, iy as f64 * h.y);
    CellGeometry {
      idx: icell,
      min,
      hx: h.x,
      hy: h.y,
    }
  }

  pub fn cells(&self) -> impl Iterator<Item = CellGeometry> + '_ {
    (0..self.ncells()).map(|icell| self.cell(icell))
  }

  pub fn interior_facets(&self) -> Vec<InteriorFacet> {
    let n = self.ncells_axis;
    let mut facets = Vec::with_capacity(2 * n * (n - 1));
    for iy in 0..n {
      for ix in 0..n - 1 {
        facets.push(InteriorFacet {
          plus: cartesian_index2linear_index([ix, iy], n),
          minus: cartesian_index2linear_index([ix + 1, iy], n),
          plus_facet: LocalFacet::Right,
          minus_facet: LocalFacet::Left,
          normal: LocalFacet::Right.normal(),
        });
      }
    }
    for iy in 0..n - 1 {
      for ix in 0..n {
        facets.push(InteriorFacet {
          plus: cartesian_index2linear_index([ix, iy], n),
          minus: cartesian_index2linear_index([ix, iy + 1], n),
          plus_facet: LocalFacet::Top,
          minus_facet: LocalFacet::Bottom,
          normal: LocalFacet::Top.normal(),
        });
      }
    }
    facets
  }

  pub fn boundary_facets(&self) -> Vec<BoundaryFacet> {
    let n = self.ncells_axis;
    let mut facets = Vec::with_capacity(4 * n);
    let mut push = |ix, iy, facet: LocalFacet| {
      facets.push(BoundaryFacet {
        cell: cartesian_index2linear_index([ix, iy], n),
        facet,
        normal: facet.normal(),
      })
    };
    for i in 0..n {
      push(i, 0, LocalFacet::Bottom);
      push(i, n - 1, LocalFacet::Top);
      push(0, i, LocalFacet::Left);
      push(n - 1, i, LocalFacet::Right);
    }
    facets
  }

  pub fn vertex_coord(&self, ivertex: VertexIdx) -> Point {
    let [ix, iy] = linear_index2cartesian_index(ivertex, self.nvertices_axis());
    let h = self.cell_extents();
    self.rect.min() + Vector2::new(ix as f64 * h.x, iy as f64 * h.y)
  }

  /// Vertices of a cell in counter-clockwise order starting at the lower-left corner.
  pub fn cell_vertices(&self, icell: CellIdx) -> [VertexIdx; 4] {
    let [ix, iy] = linear_index2cartesian_index(icell, self.ncells_axis);
    let nv = self.nvertices_axis();
    let ll = cartesian_index2linear_index([ix, iy], nv);
    [ll, ll + 1, ll + 1 + nv, ll + nv]
  }

  /// The two vertices of a boundary facet, ordered in direction of the facet parameter.
  pub fn boundary_facet_vertices(&self, facet: &BoundaryFacet) -> [VertexIdx; 2] {
    let [v0, v1, v2, v3] = self.cell_vertices(facet.cell);
    match facet.facet {
      LocalFacet::Bottom => [v0, v1],
      LocalFacet::Right => [v1, v2],
      LocalFacet::Top => [v3, v2],
      LocalFacet::Left => [v0, v3],
    }
  }

  pub fn boundary_vertices(&self) -> Vec<VertexIdx> {
    let nv = self.nvertices_axis();
    (0..self.nvertices())
      .filter(|&iv| {
        let [ix, iy] = linear_index2cartesian_index(iv, nv);
        ix == 0 || iy == 0 || ix == nv - 1 || iy == nv - 1
      })
      .collect()
  }
}
