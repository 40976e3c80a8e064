//! NIfTI volume and stack I/O.

use std::path::Path;

use ndarray::{Ix3, Ix4};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use motcor_core::geometry::Matrix4;
use motcor_core::{MotionError, Result, Volume, VolumeGeometry, VolumeStack};

/// Voxel-to-world affine from a NIfTI header: sform when set, else qform,
/// else pixdim scaling only.
fn affine_from_header(header: &NiftiHeader) -> Matrix4 {
    let rows: [[f32; 4]; 3] = if header.sform_code > 0 {
        [header.srow_x, header.srow_y, header.srow_z]
    } else if header.qform_code > 0 {
        // Quaternion form, see the NIfTI-1 standard.
        let b = f64::from(header.quatern_b);
        let c = f64::from(header.quatern_c);
        let d = f64::from(header.quatern_d);
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 {
            1.0
        } else {
            f64::from(header.pixdim[0])
        };
        let dx = f64::from(header.pixdim[1]);
        let dy = f64::from(header.pixdim[2]);
        let dz = f64::from(header.pixdim[3]) * qfac;

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * b * c - 2.0 * a * d;
        let r13 = 2.0 * b * d + 2.0 * a * c;
        let r21 = 2.0 * b * c + 2.0 * a * d;
        let r22 = a * a + c * c - b * b - d * d;
        let r23 = 2.0 * c * d - 2.0 * a * b;
        let r31 = 2.0 * b * d - 2.0 * a * c;
        let r32 = 2.0 * c * d + 2.0 * a * b;
        let r33 = a * a + d * d - c * c - b * b;

        [
            [
                (r11 * dx) as f32,
                (r12 * dy) as f32,
                (r13 * dz) as f32,
                header.quatern_x,
            ],
            [
                (r21 * dx) as f32,
                (r22 * dy) as f32,
                (r23 * dz) as f32,
                header.quatern_y,
            ],
            [
                (r31 * dx) as f32,
                (r32 * dy) as f32,
                (r33 * dz) as f32,
                header.quatern_z,
            ],
        ]
    } else {
        [
            [header.pixdim[1], 0.0, 0.0, 0.0],
            [0.0, header.pixdim[2], 0.0, 0.0],
            [0.0, 0.0, header.pixdim[3], 0.0],
        ]
    };

    let mut m = Matrix4::identity();
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            m[(i, j)] = f64::from(v);
        }
    }
    m
}

/// NIfTI header carrying the geometry's sform affine.
fn header_for(geometry: &VolumeGeometry, num_frames: Option<usize>) -> NiftiHeader {
    let shape = geometry.shape();
    let spacing = geometry.spacing();
    let affine = geometry.affine();

    let mut header = NiftiHeader::default();
    header.dim = match num_frames {
        Some(n) => [4, shape[0] as u16, shape[1] as u16, shape[2] as u16, n as u16, 1, 1, 1],
        None => [3, shape[0] as u16, shape[1] as u16, shape[2] as u16, 1, 1, 1, 1],
    };
    header.pixdim = [
        1.0,
        spacing.x as f32,
        spacing.y as f32,
        spacing.z as f32,
        1.0,
        1.0,
        1.0,
        1.0,
    ];
    header.sform_code = 1;
    header.qform_code = 0;
    for j in 0..4 {
        header.srow_x[j] = affine[(0, j)] as f32;
        header.srow_y[j] = affine[(1, j)] as f32;
        header.srow_z[j] = affine[(2, j)] as f32;
    }
    header
}

/// Read a 3D volume.
///
/// # Errors
/// Returns an input error when the file is missing, unreadable, or not 3D.
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<Volume> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| MotionError::input(format!("failed to read {}: {}", path.display(), e)))?;
    let affine = affine_from_header(obj.header());

    let array = obj
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|e| MotionError::input(format!("failed to decode {}: {}", path.display(), e)))?;
    let data = array.into_dimensionality::<Ix3>().map_err(|_| {
        MotionError::input(format!("{}: expected a 3D volume", path.display()))
    })?;

    let shape = [data.shape()[0], data.shape()[1], data.shape()[2]];
    Ok(Volume::new(data, VolumeGeometry::from_affine(shape, &affine)))
}

/// Read a 4D volume stack. Frame order is the file's temporal order.
///
/// # Errors
/// Returns an input error when the file is missing, unreadable, or not 4D.
pub fn read_stack<P: AsRef<Path>>(path: P) -> Result<VolumeStack> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| MotionError::input(format!("failed to read {}: {}", path.display(), e)))?;
    let affine = affine_from_header(obj.header());

    let array = obj
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|e| MotionError::input(format!("failed to decode {}: {}", path.display(), e)))?;
    let data = array.into_dimensionality::<Ix4>().map_err(|_| {
        MotionError::input(format!("{}: expected a 4D volume stack", path.display()))
    })?;

    let shape = [data.shape()[0], data.shape()[1], data.shape()[2]];
    Ok(VolumeStack::new(data, VolumeGeometry::from_affine(shape, &affine)))
}

/// Write a 3D volume with its sform affine.
pub fn write_volume<P: AsRef<Path>>(path: P, volume: &Volume) -> Result<()> {
    let path = path.as_ref();
    let header = header_for(volume.geometry(), None);
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(volume.data())
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}

/// Write a 4D volume stack with its sform affine.
pub fn write_stack<P: AsRef<Path>>(path: P, stack: &VolumeStack) -> Result<()> {
    let path = path.as_ref();
    let header = header_for(stack.geometry(), Some(stack.num_frames()));
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(stack.data())
        .map_err(|e| MotionError::input(format!("failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use motcor_core::geometry::{Point3, Vector3};
    use nalgebra::Matrix3;
    use ndarray::{Array3, Array4};
    use tempfile::tempdir;

    fn geometry() -> VolumeGeometry {
        VolumeGeometry::new(
            [3, 4, 5],
            Point3::new(-12.0, 8.0, 3.0),
            Vector3::new(2.0, 2.5, 3.0),
            Matrix3::identity(),
        )
    }

    #[test]
    fn test_volume_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vol.nii");

        let data: Array3<f32> =
            Array3::from_shape_fn((3, 4, 5), |(i, j, k)| (i + 10 * j + 100 * k) as f32);
        let volume = Volume::new(data.clone(), geometry());
        write_volume(&path, &volume).unwrap();

        let back = read_volume(&path).unwrap();
        assert_eq!(back.data(), &data);
        assert!(back.geometry().same_grid(&geometry()));
    }

    #[test]
    fn test_stack_roundtrip_preserves_frame_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.nii");

        let data: Array4<f32> = Array4::from_shape_fn((3, 4, 5, 3), |(_, _, _, t)| t as f32);
        let stack = VolumeStack::new(data, geometry());
        write_stack(&path, &stack).unwrap();

        let back = read_stack(&path).unwrap();
        assert_eq!(back.num_frames(), 3);
        for t in 0..3 {
            let frame = back.frame(t).unwrap();
            assert_eq!(frame.data()[[1, 1, 1]], t as f32);
        }
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = read_volume("/nonexistent/volume.nii").unwrap_err();
        assert!(matches!(err, MotionError::Input(_)));
    }

    #[test]
    fn test_volume_reader_rejects_stack() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.nii");
        let data: Array4<f32> = Array4::zeros((3, 4, 5, 2));
        write_stack(&path, &VolumeStack::new(data, geometry())).unwrap();

        assert!(read_volume(&path).is_err());
    }
}
