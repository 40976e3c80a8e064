use nalgebra::{Matrix3 as NaMatrix3, Matrix4 as NaMatrix4, Point3 as NaPoint3, Vector3 as NaVector3};

pub type Point3 = NaPoint3<f64>;
pub type Vector3 = NaVector3<f64>;
pub type Matrix3 = NaMatrix3<f64>;
pub type Matrix4 = NaMatrix4<f64>;
