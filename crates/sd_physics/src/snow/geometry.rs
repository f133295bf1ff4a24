// crates/sd_physics/src/snow/geometry.rs

//! 逐面几何缓存
//!
//! 初始化时为每个三角形单元缓存棱柱的五个面：三条边的外法向
//! 扩展为 z 分量为零的三维向量，加上顶面 (0,0,1) 与底面
//! (0,0,-1)。侧面面积为边长 × 层高，顶/底面积为单元面积。
//! 缓存建立后不再修改。
//!
//! 缓存存放在模块私有的数组里，按稳定 cell id 索引，避免在
//! 网格上挂接异构数据。

use glam::DVec3;
use rayon::prelude::*;
use sd_mesh::TriMesh;

/// 单面棱柱几何
#[derive(Debug, Clone)]
pub struct FaceGeometry {
    /// 五个面的单位法向: 0..2 侧面（z=0）, 3 顶面, 4 底面
    pub m: [DVec3; 5],
    /// 五个面的面积: 0..2 = 边长×层高, 3 = 4 = 单元面积
    pub area: [f64; 5],
    /// 每条边是否有邻居
    pub neighbor: [bool; 3],
    /// 是否为边缘单元（任一边无邻居）
    pub is_edge: bool,
}

/// 建立全网格几何缓存
pub fn build_geometry_cache(mesh: &TriMesh, layer_height: f64) -> Vec<FaceGeometry> {
    mesh.faces()
        .into_par_iter()
        .map(|i| {
            let mut m = [DVec3::ZERO; 5];
            let mut area = [0.0; 5];
            let mut neighbor = [false; 3];

            for j in 0..3 {
                let n = mesh.edge_unit_normal(i, j);
                m[j] = DVec3::new(n.x, n.y, 0.0);
                area[j] = mesh.edge_length(i, j) * layer_height;
                neighbor[j] = mesh.has_neighbor(i, j);
            }
            m[3] = DVec3::Z;
            m[4] = -DVec3::Z;
            area[3] = mesh.area(i);
            area[4] = mesh.area(i);

            FaceGeometry {
                m,
                area,
                neighbor,
                is_edge: neighbor.iter().any(|&b| !b),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_mesh::generation::{equilateral_triangle, triangle_pair};

    #[test]
    fn test_single_triangle_cache() {
        let mesh = equilateral_triangle(100.0);
        let cache = build_geometry_cache(&mesh, 1.0);
        assert_eq!(cache.len(), 1);

        let g = &cache[0];
        assert!(g.is_edge);
        assert_eq!(g.neighbor, [false; 3]);
        // 侧面面积 = 边长 × 层高
        for j in 0..3 {
            assert!((g.area[j] - 100.0).abs() < 1e-9);
            assert!(g.m[j].z.abs() < 1e-14);
            assert!((g.m[j].length() - 1.0).abs() < 1e-12);
        }
        // 顶/底面积 = 单元面积
        assert!((g.area[3] - mesh.area(0)).abs() < 1e-9);
        assert_eq!(g.area[3], g.area[4]);
        assert_eq!(g.m[3], DVec3::Z);
        assert_eq!(g.m[4], -DVec3::Z);
    }

    #[test]
    fn test_pair_neighbor_flags() {
        let mesh = triangle_pair(100.0);
        let cache = build_geometry_cache(&mesh, 1.0);
        // 每个单元恰有一条共享边
        for g in &cache {
            assert_eq!(g.neighbor.iter().filter(|&&b| b).count(), 1);
            assert!(g.is_edge);
        }
    }
}
