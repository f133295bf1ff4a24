// crates/sd_mesh/src/mesh.rs

//! 不可变三角网格（SoA 布局）
//!
//! 每个三角形单元携带物理引擎需要的全部几何与拓扑：面积、形心、
//! 高程、三条边的长度与外法向、三个可选邻居。单元编号即稳定
//! cell id，取值范围 [0, n_faces)。
//!
//! # 布局说明
//!
//! 采用数组结构（SoA）而非对象数组：逐面并行计算时缓存友好，
//! 且所有切片可被只读共享借用。边界哨兵使用 `u32::MAX`。
//!
//! # 约定
//!
//! - 单元顶点按逆时针排列（构建时自动翻转顺时针输入）
//! - 边 j 连接顶点 j 与顶点 (j+1)%3，邻居 j 跨越边 j
//! - 外法向为平面内单位向量（z 分量恒为 0，由物理层按需扩展）

use crate::error::{MeshError, MeshResult};
use glam::{DVec2, DVec3};
use sd_core::tolerance::GEOM_EPS;
use std::collections::HashMap;

/// 边界哨兵：无邻居
const NO_NEIGHBOR: u32 = u32::MAX;

/// 不可变三角网格
#[derive(Debug, Clone)]
pub struct TriMesh {
    n_faces: usize,
    face_area: Vec<f64>,
    face_center: Vec<DVec2>,
    face_elevation: Vec<f64>,
    edge_length: Vec<[f64; 3]>,
    edge_normal: Vec<[DVec2; 3]>,
    neighbor: Vec<[u32; 3]>,
}

impl TriMesh {
    /// 从节点与单元列表构建网格
    ///
    /// # 参数
    ///
    /// - `nodes`: 节点坐标（x, y 为平面坐标，z 为高程）
    /// - `cells`: 每个单元的三个节点索引，绕向任意
    ///
    /// # 错误
    ///
    /// - 节点索引越界
    /// - 单元面积低于 [`GEOM_EPS`]
    /// - 同一条边被三个及以上单元共享（非流形）
    pub fn from_cells(nodes: &[DVec3], cells: &[[usize; 3]]) -> MeshResult<Self> {
        if cells.is_empty() {
            return Err(MeshError::Empty);
        }

        let n_faces = cells.len();
        let mut face_area = Vec::with_capacity(n_faces);
        let mut face_center = Vec::with_capacity(n_faces);
        let mut face_elevation = Vec::with_capacity(n_faces);
        let mut edge_length = Vec::with_capacity(n_faces);
        let mut edge_normal = Vec::with_capacity(n_faces);
        let mut oriented = Vec::with_capacity(n_faces);

        for (cell, idx) in cells.iter().enumerate() {
            for &node in idx {
                if node >= nodes.len() {
                    return Err(MeshError::NodeIndexOutOfBounds {
                        cell,
                        node,
                        n_nodes: nodes.len(),
                    });
                }
            }

            let mut v = *idx;
            let p = |k: usize| DVec2::new(nodes[v[k]].x, nodes[v[k]].y);
            let signed_area = |a: DVec2, b: DVec2, c: DVec2| {
                0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
            };

            let mut area = signed_area(p(0), p(1), p(2));
            if area < 0.0 {
                // 翻转为逆时针
                v.swap(1, 2);
                area = -area;
            }
            if area < GEOM_EPS {
                return Err(MeshError::DegenerateCell { cell, area });
            }

            let pts = [
                DVec2::new(nodes[v[0]].x, nodes[v[0]].y),
                DVec2::new(nodes[v[1]].x, nodes[v[1]].y),
                DVec2::new(nodes[v[2]].x, nodes[v[2]].y),
            ];

            let mut lengths = [0.0; 3];
            let mut normals = [DVec2::ZERO; 3];
            for j in 0..3 {
                let a = pts[j];
                let b = pts[(j + 1) % 3];
                let d = b - a;
                let len = d.length();
                lengths[j] = len;
                // 逆时针多边形: 边向量顺时针旋转 90° 得外法向
                normals[j] = DVec2::new(d.y, -d.x) / len;
            }

            face_area.push(area);
            face_center.push((pts[0] + pts[1] + pts[2]) / 3.0);
            face_elevation.push((nodes[v[0]].z + nodes[v[1]].z + nodes[v[2]].z) / 3.0);
            edge_length.push(lengths);
            edge_normal.push(normals);
            oriented.push(v);
        }

        // 共享边匹配：无向边 (min, max) -> (单元, 边号)
        let mut neighbor = vec![[NO_NEIGHBOR; 3]; n_faces];
        let mut edge_map: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for (cell, v) in oriented.iter().enumerate() {
            for j in 0..3 {
                let a = v[j];
                let b = v[(j + 1) % 3];
                let key = (a.min(b), a.max(b));
                match edge_map.get(&key) {
                    None => {
                        edge_map.insert(key, (cell, j));
                    }
                    Some(&(other, other_j)) => {
                        if neighbor[other][other_j] != NO_NEIGHBOR {
                            return Err(MeshError::NonManifoldEdge {
                                a: key.0,
                                b: key.1,
                                first: neighbor[other][other_j] as usize,
                                second: other,
                                third: cell,
                            });
                        }
                        neighbor[other][other_j] = cell as u32;
                        neighbor[cell][j] = other as u32;
                    }
                }
            }
        }

        Ok(Self {
            n_faces,
            face_area,
            face_center,
            face_elevation,
            edge_length,
            edge_normal,
            neighbor,
        })
    }

    // =========================================================================
    // 基本统计
    // =========================================================================

    /// 单元数量
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.n_faces
    }

    /// 单元索引范围
    #[inline]
    pub fn faces(&self) -> std::ops::Range<usize> {
        0..self.n_faces
    }

    // =========================================================================
    // 单元访问
    // =========================================================================

    /// 单元面积 [m²]
    #[inline]
    pub fn area(&self, face: usize) -> f64 {
        self.face_area[face]
    }

    /// 单元形心（平面坐标）
    #[inline]
    pub fn center(&self, face: usize) -> DVec2 {
        self.face_center[face]
    }

    /// 单元高程 [m]（顶点高程均值）
    #[inline]
    pub fn elevation(&self, face: usize) -> f64 {
        self.face_elevation[face]
    }

    /// 边长度 [m]
    #[inline]
    pub fn edge_length(&self, face: usize, edge: usize) -> f64 {
        self.edge_length[face][edge]
    }

    /// 边外法向（平面内单位向量）
    #[inline]
    pub fn edge_unit_normal(&self, face: usize, edge: usize) -> DVec2 {
        self.edge_normal[face][edge]
    }

    /// 跨越边 edge 的邻居单元
    #[inline]
    pub fn neighbor(&self, face: usize, edge: usize) -> Option<usize> {
        let n = self.neighbor[face][edge];
        if n == NO_NEIGHBOR {
            None
        } else {
            Some(n as usize)
        }
    }

    /// 边 edge 是否有邻居
    #[inline]
    pub fn has_neighbor(&self, face: usize, edge: usize) -> bool {
        self.neighbor[face][edge] != NO_NEIGHBOR
    }

    /// 是否为边缘单元（至少一条边无邻居）
    #[inline]
    pub fn is_edge_face(&self, face: usize) -> bool {
        self.neighbor[face].iter().any(|&n| n == NO_NEIGHBOR)
    }

    /// 两单元形心距离 [m]
    #[inline]
    pub fn center_distance(&self, a: usize, b: usize) -> f64 {
        (self.face_center[a] - self.face_center[b]).length()
    }
}
