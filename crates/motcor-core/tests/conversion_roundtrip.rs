use motcor_core::geometry::{Matrix4, Point3, Vector3};
use motcor_core::transform::flirt::{flirt_to_world, world_to_flirt};
use motcor_core::transform::RigidTransform;
use motcor_core::volume::VolumeGeometry;
use nalgebra::Matrix3;
use proptest::prelude::*;

fn max_abs_diff(a: &Matrix4, b: &Matrix4) -> f64 {
    (a - b).iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

proptest! {
    #[test]
    fn test_flirt_roundtrip(
        ox in -100.0f64..100.0, oy in -100.0f64..100.0, oz in -100.0f64..100.0,
        sx in 0.5f64..4.0, sy in 0.5f64..4.0, sz in 0.5f64..4.0,
        tx in -20.0f64..20.0, ty in -20.0f64..20.0, tz in -20.0f64..20.0,
        rx in -0.5f64..0.5, ry in -0.5f64..0.5, rz in -0.5f64..0.5
    ) {
        let geometry = VolumeGeometry::new(
            [32, 40, 24],
            Point3::new(ox, oy, oz),
            Vector3::new(sx, sy, sz),
            Matrix3::identity(),
        );
        let world = RigidTransform::from_euler(Vector3::new(tx, ty, tz), rx, ry, rz);

        let flirt = world_to_flirt(world.matrix(), &geometry, &geometry).unwrap();
        let back = flirt_to_world(&flirt, &geometry, &geometry).unwrap();

        let residual = max_abs_diff(&back, world.matrix());
        prop_assert!(residual < 1e-8, "roundtrip residual {}", residual);
    }

    #[test]
    fn test_euler_rebuild_roundtrip(
        tx in -30.0f64..30.0, ty in -30.0f64..30.0, tz in -30.0f64..30.0,
        rx in -1.2f64..1.2, ry in -1.2f64..1.2, rz in -1.2f64..1.2
    ) {
        use motcor_core::transform::{MotionParams, ParamConvention};

        let transform = RigidTransform::from_euler(Vector3::new(tx, ty, tz), rx, ry, rz);
        let params = MotionParams::from_transform(&transform, ParamConvention::Fsl);
        let rebuilt = RigidTransform::from_euler(
            Vector3::new(params.tx, params.ty, params.tz),
            params.rx,
            params.ry,
            params.rz,
        );

        let residual = max_abs_diff(rebuilt.matrix(), transform.matrix());
        prop_assert!(residual < 1e-9, "euler residual {}", residual);
    }
}
