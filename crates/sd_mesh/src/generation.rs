// crates/sd_mesh/src/generation.rs

//! 测试网格生成
//!
//! 提供确定性的小型网格，用于单元测试与场景验证：
//!
//! - [`equilateral_triangle`]: 单个等边三角形
//! - [`triangle_pair`]: 共享一条边的两个三角形（菱形）
//! - [`FanMeshGenerator`]: 绕公共顶点的三角形扇面
//!
//! # 使用示例
//!
//! ```
//! use sd_mesh::generation::{equilateral_triangle, FanMeshGenerator};
//!
//! let single = equilateral_triangle(100.0);
//! assert_eq!(single.n_faces(), 1);
//!
//! let patch = FanMeshGenerator::new(5, 100.0).build();
//! assert_eq!(patch.n_faces(), 5);
//! ```

use crate::mesh::TriMesh;
use glam::DVec3;

/// 单个平放等边三角形，底边沿 x 轴
///
/// 边长 `edge` 时面积为 √3/4·edge²（edge=100 时约 4330.127 m²）。
pub fn equilateral_triangle(edge: f64) -> TriMesh {
    let h = edge * 3f64.sqrt() / 2.0;
    let nodes = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(edge, 0.0, 0.0),
        DVec3::new(edge / 2.0, h, 0.0),
    ];
    TriMesh::from_cells(&nodes, &[[0, 1, 2]]).expect("等边三角形构建不应失败")
}

/// 共享一条边的两个等边三角形（菱形）
///
/// 单元 0 为左下三角形，单元 1 为右上三角形；共享边从 (edge, 0)
/// 到 (edge/2, √3/2·edge)，单元 0 的该边外法向指向 (√3/2, 1/2)。
pub fn triangle_pair(edge: f64) -> TriMesh {
    let h = edge * 3f64.sqrt() / 2.0;
    let nodes = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(edge, 0.0, 0.0),
        DVec3::new(edge / 2.0, h, 0.0),
        DVec3::new(1.5 * edge, h, 0.0),
    ];
    TriMesh::from_cells(&nodes, &[[0, 1, 2], [1, 3, 2]]).expect("菱形网格构建不应失败")
}

/// 三角形扇面生成器
///
/// 以原点为公共顶点，`n` 个三角形沿半圆均匀展开。相邻三角形
/// 共享一条径向边，所有单元都含边界边。
pub struct FanMeshGenerator {
    /// 三角形数量
    n: usize,
    /// 径向半径 [m]
    radius: f64,
    /// 统一高程 [m]
    elevation: f64,
}

impl FanMeshGenerator {
    /// 创建扇面生成器
    pub fn new(n: usize, radius: f64) -> Self {
        Self {
            n,
            radius,
            elevation: 0.0,
        }
    }

    /// 设置统一高程
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    /// 构建网格
    pub fn build(&self) -> TriMesh {
        assert!(self.n >= 1, "扇面至少包含一个三角形");
        let mut nodes = Vec::with_capacity(self.n + 2);
        nodes.push(DVec3::new(0.0, 0.0, self.elevation));
        // 半圆上 n+1 个轮辐节点
        for k in 0..=self.n {
            let theta = std::f64::consts::PI * k as f64 / self.n as f64;
            nodes.push(DVec3::new(
                self.radius * theta.cos(),
                self.radius * theta.sin(),
                self.elevation,
            ));
        }
        let cells: Vec<[usize; 3]> = (0..self.n).map(|k| [0, k + 1, k + 2]).collect();
        TriMesh::from_cells(&nodes, &cells).expect("扇面网格构建不应失败")
    }
}
