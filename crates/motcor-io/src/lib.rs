pub mod matrix_io;
pub mod nifti_io;
pub mod params_io;
pub mod transform_io;

pub use matrix_io::{read_matrix, write_matrix};
pub use nifti_io::{read_stack, read_volume, write_stack, write_volume};
pub use params_io::{write_params, write_rms};
pub use transform_io::{read_transform_stack, write_transform, write_transform_stack};
