// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Halfmesh Tess
//!
//! Triangulation of halfmesh faces, holes included.
//!
//! ```
//! use halfmesh_kernel::Mesh;
//! use halfmesh_tess::{tessellate_face, TessConfig};
//! use nalgebra::Point3;
//!
//! let mut mesh = Mesh::new();
//! let verts: Vec<_> = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (1.0, 0.5), (0.0, 2.0)]
//!     .iter()
//!     .map(|&(x, y)| mesh.make_vertex(Point3::new(x, y, 0.0)))
//!     .collect();
//! let f = mesh.make_face(&verts).unwrap();
//!
//! let tris = tessellate_face(&mesh, f, &TessConfig::default()).unwrap();
//! assert_eq!(tris.len(), 3);
//! ```

pub mod apply;
pub mod cdt;
pub mod config;
pub mod delaunay;
pub mod error;
pub mod predicates;
pub mod tessellate;

pub use apply::triangulate_face;
pub use cdt::{Cdt, CdtOutput};
pub use config::TessConfig;
pub use error::{Error, Result};
pub use tessellate::{
    tessellate_dirty, tessellate_face, tessellate_mesh, triangulate_quad, FaceTriangles,
    Tessellation,
};
