use crate::error::PhysicsError;
use crate::math::{Aabb, Transform, Vector3};
use crate::Result;

/// Identifies one triangle of a height field grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriangleIndex {
    /// Column of the cell (along local X)
    pub column: usize,

    /// Row of the cell (along local Z)
    pub row: usize,

    /// Whether this is the second triangle of the cell
    pub second: bool,
}

impl TriangleIndex {
    /// Creates a new triangle index
    pub fn new(column: usize, row: usize, second: bool) -> Self {
        Self { column, row, second }
    }

    /// A stable identifier for contacts generated against this triangle
    pub fn feature_id(&self) -> u32 {
        ((self.row as u32) << 16) | ((self.column as u32 & 0x7fff) << 1) | self.second as u32
    }
}

/// A height field collision shape (terrain)
///
/// Vertex `(column, row)` sits at local `(column, height, row)`; the owning
/// collidable's transform scale sets the grid spacing. Each cell is split into
/// two triangles whose face normal `(C - A) x (B - A)` points along local +Y.
#[derive(Debug, Clone)]
pub struct HeightField {
    /// The height values of the terrain, row-major
    heights: Vec<f32>,

    /// The width of the height field (number of columns)
    width: usize,

    /// The depth of the height field (number of rows)
    depth: usize,

    /// The minimum height value
    min_height: f32,

    /// The maximum height value
    max_height: f32,
}

impl HeightField {
    /// Creates a new height field with the given dimensions and height values
    pub fn new(heights: Vec<f32>, width: usize, depth: usize) -> Result<Self> {
        if width < 2 || depth < 2 {
            return Err(PhysicsError::InvalidParameter(format!(
                "Height field needs at least 2x2 samples, got {}x{}",
                width, depth
            )));
        }
        if heights.len() != width * depth {
            return Err(PhysicsError::InvalidParameter(format!(
                "Height field has {} samples but dimensions {}x{}",
                heights.len(),
                width,
                depth
            )));
        }

        let min_height = heights.iter().fold(f32::MAX, |min, &height| min.min(height));
        let max_height = heights.iter().fold(f32::MIN, |max, &height| max.max(height));

        Ok(Self {
            heights,
            width,
            depth,
            min_height,
            max_height,
        })
    }

    /// Creates a flat height field at the given height
    pub fn flat(width: usize, depth: usize, height: f32) -> Result<Self> {
        Self::new(vec![height; width * depth], width, depth)
    }

    /// Returns the width of the height field
    pub fn get_width(&self) -> usize {
        self.width
    }

    /// Returns the depth of the height field
    pub fn get_depth(&self) -> usize {
        self.depth
    }

    /// Returns the height at the given sample, or zero outside the grid
    pub fn get_height(&self, column: usize, row: usize) -> f32 {
        if column < self.width && row < self.depth {
            self.heights[row * self.width + column]
        } else {
            0.0
        }
    }

    /// Returns the local bounding box of the height field
    pub fn get_local_bounds(&self) -> Aabb {
        Aabb::new(
            Vector3::new(0.0, self.min_height, 0.0),
            Vector3::new((self.width - 1) as f32, self.max_height, (self.depth - 1) as f32),
        )
    }

    /// Returns the world bounding box of the height field
    pub fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        self.get_local_bounds().transformed(transform)
    }

    /// Returns a grid vertex in local space
    pub fn get_local_vertex(&self, column: usize, row: usize) -> Vector3 {
        Vector3::new(column as f32, self.get_height(column, row), row as f32)
    }

    /// Returns the three local-space vertices of a triangle
    pub fn get_local_triangle(&self, index: TriangleIndex) -> [Vector3; 3] {
        let (c, r) = (index.column, index.row);
        if index.second {
            [
                self.get_local_vertex(c + 1, r),
                self.get_local_vertex(c + 1, r + 1),
                self.get_local_vertex(c, r + 1),
            ]
        } else {
            [
                self.get_local_vertex(c, r),
                self.get_local_vertex(c + 1, r),
                self.get_local_vertex(c, r + 1),
            ]
        }
    }

    /// Returns the three world-space vertices of a triangle
    pub fn triangle(&self, index: TriangleIndex, transform: &Transform) -> [Vector3; 3] {
        self.get_local_triangle(index).map(|v| transform.transform_point(v))
    }

    /// Collects the triangles whose cells overlap a world-space box
    pub fn overlapped_triangles(&self, world_bounds: &Aabb, transform: &Transform, triangles: &mut Vec<TriangleIndex>) {
        triangles.clear();

        let mut local = Aabb::new(
            transform.inverse_transform_point(world_bounds.min),
            transform.inverse_transform_point(world_bounds.min),
        );
        for corner in world_bounds.corners() {
            local.expand_to_include_point(transform.inverse_transform_point(corner));
        }

        if local.max.y < self.min_height || local.min.y > self.max_height {
            return;
        }

        let last_column = (self.width - 1) as f32;
        let last_row = (self.depth - 1) as f32;
        if local.max.x < 0.0 || local.min.x > last_column || local.max.z < 0.0 || local.min.z > last_row {
            return;
        }

        let column_start = local.min.x.max(0.0).floor() as usize;
        let column_end = (local.max.x.ceil().min(last_column) as usize).max(column_start + 1).min(self.width - 1);
        let row_start = local.min.z.max(0.0).floor() as usize;
        let row_end = (local.max.z.ceil().min(last_row) as usize).max(row_start + 1).min(self.depth - 1);

        for row in row_start..row_end {
            for column in column_start..column_end {
                let cell_min = self
                    .cell_heights(column, row)
                    .iter()
                    .fold(f32::MAX, |min, &h| min.min(h));
                let cell_max = self
                    .cell_heights(column, row)
                    .iter()
                    .fold(f32::MIN, |max, &h| max.max(h));
                if local.max.y < cell_min || local.min.y > cell_max {
                    continue;
                }

                triangles.push(TriangleIndex::new(column, row, false));
                triangles.push(TriangleIndex::new(column, row, true));
            }
        }
    }

    fn cell_heights(&self, column: usize, row: usize) -> [f32; 4] {
        [
            self.get_height(column, row),
            self.get_height(column + 1, row),
            self.get_height(column, row + 1),
            self.get_height(column + 1, row + 1),
        ]
    }
}
