// crates/sd_physics/src/snow/module.rs

//! 风吹雪模块
//!
//! 把各阶段串成逐时间步流水线并对接模块抽象：
//!
//! 跃移 → 悬移装配 → 悬移求解（BiCGStab + Chow–Patel ILU）→
//! 升华 → 散度装配 → 散度求解（BiCGStab）→ 质量更新。
//!
//! 阶段之间 barrier 分隔；阶段内逐面并行，各面只写自己的行与
//! 自己的输出标量。两次求解是仅有的长阻塞操作。

use crate::error::{PhysicsError, PhysicsResult};
use crate::fields::FieldStore;
use crate::module::{Module, ParamMap};
use crate::numerics::linear_algebra::{
    BiCgStabSolver, ChowPatelIlu, ChowPatelIluConfig, IdentityPreconditioner, IterativeSolver,
    SolverConfig, SolverResult,
};
use crate::snow::divergence::assemble_divergence;
use crate::snow::geometry::{build_geometry_cache, FaceGeometry};
use crate::snow::saltation::{compute_saltation, SaltState};
use crate::snow::sublimation::{compute_sublimation, SublimationOutput};
use crate::snow::suspension::assemble_suspension;
use crate::snow::{LAYER_HEIGHT, N_LAYER};
use crate::types::{BlowingSnowConfig, PhysicalConstants};
use crate::ConfigError;
use rayon::prelude::*;
use sd_mesh::TriMesh;

/// 注册表键名
pub const MODULE_NAME: &str = "pbsm3d";

/// 声明的输入字段
const DEPENDS: &[&str] = &["U_2m_above_srf", "vw_dir", "swe", "t", "rh"];

/// 声明的输出字段
const PROVIDES: &[&str] = &[
    "u10",
    "is_drifting",
    "hs",
    "ustar",
    "u*_th",
    "csalt",
    "Qsalt",
    "Qsusp_pbsm",
    "Qsusp",
    "Qsubl",
    "drift_mass",
    "drift_mass_no_subl",
    "sum_drift",
    "c0",
    "c1",
    "c2",
    "c3",
    "c4",
    "K0",
    "K1",
    "K2",
    "K3",
    "K4",
];

/// 风吹雪输运与升华模块
pub struct BlowingSnow {
    config: BlowingSnowConfig,
    constants: PhysicalConstants,
    ilu_config: ChowPatelIluConfig,
    /// 逐面几何缓存，init 时建立后不再修改
    geometry: Vec<FaceGeometry>,
    susp_solver: BiCgStabSolver<f64>,
    div_solver: BiCgStabSolver<f64>,
}

impl BlowingSnow {
    /// 创建模块（配置在此处校验）
    pub fn new(config: BlowingSnowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            constants: PhysicalConstants::default(),
            ilu_config: ChowPatelIluConfig::default(),
            geometry: Vec::new(),
            susp_solver: BiCgStabSolver::new(SolverConfig::default()),
            div_solver: BiCgStabSolver::new(SolverConfig::default()),
        })
    }

    /// 从松散参数表创建（注册表入口）
    pub fn from_params(params: &ParamMap) -> Result<Self, ConfigError> {
        Self::new(BlowingSnowConfig::from_params(params)?)
    }

    /// 当前配置
    pub fn config(&self) -> &BlowingSnowConfig {
        &self.config
    }

    fn check_converged(
        system: &'static str,
        result: &SolverResult<f64>,
    ) -> PhysicsResult<()> {
        if result.is_converged() {
            Ok(())
        } else {
            Err(PhysicsError::SolverFailed {
                system,
                status: result.status,
                iterations: result.iterations,
                relative_residual: result.relative_residual,
            })
        }
    }
}

impl Module for BlowingSnow {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn depends(&self) -> &'static [&'static str] {
        DEPENDS
    }

    fn provides(&self) -> &'static [&'static str] {
        PROVIDES
    }

    fn init(&mut self, mesh: &TriMesh, fields: &mut FieldStore) -> PhysicsResult<()> {
        self.geometry = build_geometry_cache(mesh, LAYER_HEIGHT);
        for name in PROVIDES {
            fields.register(name);
        }
        Ok(())
    }

    fn run(&mut self, mesh: &TriMesh, fields: &mut FieldStore, dt: f64) -> PhysicsResult<()> {
        let ntri = mesh.n_faces();
        assert_eq!(self.geometry.len(), ntri, "run 之前必须先 init");

        // 驱动字段快照（只读，阶段间保持不变）
        let u2 = fields.required("U_2m_above_srf")?.to_vec();
        let wdir = fields.required("vw_dir")?.to_vec();
        let swe = fields.required("swe")?.to_vec();
        let t = fields.required("t")?.to_vec();
        let rh = fields.required("rh")?.to_vec();

        // 阶段 1: 跃移（逐面并行）
        let salt: Vec<SaltState> = (0..ntri)
            .into_par_iter()
            .map(|i| compute_saltation(mesh, i, u2[i], wdir[i], swe[i], dt, &self.constants))
            .collect();

        // 阶段 2: 悬移装配（行所有权并行）
        let system = assemble_suspension(
            mesh,
            &self.geometry,
            &salt,
            &u2,
            &wdir,
            &self.config,
            &self.constants,
        );

        // 阶段 3: 悬移求解
        let mut conc = vec![0.0; ntri * N_LAYER];
        let precond = ChowPatelIlu::from_matrix(&system.matrix, &self.ilu_config);
        let result = self
            .susp_solver
            .solve(&system.matrix, &system.rhs, &mut conc, &precond);
        Self::check_converged("suspension", &result)?;

        // 阶段 4: 升华（逐面并行，粒子温度求根可失败）
        let subl: Vec<SublimationOutput> = (0..ntri)
            .into_par_iter()
            .map(|i| {
                compute_sublimation(
                    mesh,
                    &salt[i],
                    &conc,
                    ntri,
                    i,
                    u2[i],
                    t[i],
                    rh[i],
                    &self.constants,
                )
            })
            .collect::<PhysicsResult<Vec<_>>>()?;

        // 阶段 5: 散度装配
        let q_susp: Vec<f64> = subl.iter().map(|s| s.q_susp).collect();
        let (div_matrix, div_rhs) = assemble_divergence(mesh, &salt, &q_susp, &wdir);

        // 阶段 6: 散度求解
        let mut dsdt = vec![0.0; ntri];
        let result = self.div_solver.solve(
            &div_matrix,
            &div_rhs,
            &mut dsdt,
            &IdentityPreconditioner::new(),
        );
        Self::check_converged("divergence", &result)?;

        // 阶段 7: 质量更新
        let sum_old = fields.required("sum_drift")?.to_vec();
        let mut drift_mass = vec![0.0; ntri];
        let mut drift_mass_no_subl = vec![0.0; ntri];
        let mut sum_drift = vec![0.0; ntri];
        for i in 0..ntri {
            let qdep = if dsdt[i].is_nan() { 0.0 } else { dsdt[i] };
            let mass = (-qdep + subl[i].q_subl) * dt; // kg/m²
            drift_mass[i] = mass;
            drift_mass_no_subl[i] = -qdep * dt;
            sum_drift[i] = sum_old[i] + mass;
        }

        // 输出字段写回
        fields.insert("u10", salt.iter().map(|s| s.u10).collect())?;
        fields.insert(
            "is_drifting",
            salt.iter()
                .map(|s| if s.is_drifting { 1.0 } else { 0.0 })
                .collect(),
        )?;
        fields.insert("hs", salt.iter().map(|s| s.hs).collect())?;
        fields.insert("ustar", salt.iter().map(|s| s.ustar).collect())?;
        fields.insert("u*_th", salt.iter().map(|s| s.u_star_th).collect())?;
        fields.insert("csalt", salt.iter().map(|s| s.c_salt).collect())?;
        fields.insert("Qsalt", salt.iter().map(|s| s.q_salt).collect())?;
        fields.insert(
            "Qsusp_pbsm",
            salt.iter().map(|s| s.q_susp_pbsm).collect(),
        )?;
        fields.insert("Qsusp", q_susp)?;
        fields.insert("Qsubl", subl.iter().map(|s| s.q_subl).collect())?;
        for z in 0..N_LAYER {
            fields.insert(
                &format!("c{z}"),
                (0..ntri).map(|i| subl[i].conc[z]).collect(),
            )?;
            fields.insert(
                &format!("K{z}"),
                (0..ntri).map(|i| system.k_diag[ntri * z + i]).collect(),
            )?;
        }
        fields.insert("drift_mass", drift_mass)?;
        fields.insert("drift_mass_no_subl", drift_mass_no_subl)?;
        fields.insert("sum_drift", sum_drift)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_mesh::generation::equilateral_triangle;

    fn driver_fields(mesh: &TriMesh, u2: f64, wdir: f64, t: f64, rh: f64, swe: f64) -> FieldStore {
        let n = mesh.n_faces();
        let mut fields = FieldStore::new(n);
        fields.insert("U_2m_above_srf", vec![u2; n]).unwrap();
        fields.insert("vw_dir", vec![wdir; n]).unwrap();
        fields.insert("t", vec![t; n]).unwrap();
        fields.insert("rh", vec![rh; n]).unwrap();
        fields.insert("swe", vec![swe; n]).unwrap();
        fields
    }

    #[test]
    fn test_declarations() {
        let module = BlowingSnow::new(BlowingSnowConfig::default()).unwrap();
        assert_eq!(module.name(), "pbsm3d");
        assert_eq!(module.depends().len(), 5);
        assert!(module.provides().contains(&"sum_drift"));
        assert!(module.provides().contains(&"c4"));
        assert!(module.provides().contains(&"K0"));
    }

    #[test]
    fn test_init_registers_outputs() {
        let mesh = equilateral_triangle(100.0);
        let mut fields = driver_fields(&mesh, 0.0, 0.0, -10.0, 70.0, 0.0);
        let mut module = BlowingSnow::new(BlowingSnowConfig::default()).unwrap();
        module.init(&mesh, &mut fields).unwrap();

        for name in PROVIDES {
            assert!(fields.contains(name), "缺少输出字段 {}", name);
        }
        assert_eq!(fields.get("sum_drift", 0), Some(0.0));
    }

    #[test]
    fn test_missing_driver_is_error() {
        let mesh = equilateral_triangle(100.0);
        let mut fields = FieldStore::new(1);
        let mut module = BlowingSnow::new(BlowingSnowConfig::default()).unwrap();
        module.init(&mesh, &mut fields).unwrap();
        let result = module.run(&mesh, &mut fields, 3600.0);
        assert!(matches!(result, Err(PhysicsError::MissingField(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BlowingSnowConfig::default().with_settling_velocity(0.2);
        assert!(BlowingSnow::new(config).is_err());
    }
}
