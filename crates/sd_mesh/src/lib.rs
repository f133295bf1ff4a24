// crates/sd_mesh/src/lib.rs

//! snowdrift 地形网格
//!
//! 表示地形表面的二维非结构三角网格，物理引擎在其上逐面计算。
//!
//! - [`mesh`]: 不可变 SoA 布局网格 [`TriMesh`] 及其构建
//! - [`generation`]: 确定性测试网格（单三角形、菱形对、扇形片）
//! - [`error`]: 网格错误类型
//!
//! 网格一旦构建即不可变；物理引擎只读借用几何与拓扑信息。

pub mod error;
pub mod generation;
pub mod mesh;

pub use error::{MeshError, MeshResult};
pub use generation::{equilateral_triangle, triangle_pair, FanMeshGenerator};
pub use mesh::TriMesh;
