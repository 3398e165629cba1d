//! Statistical distributions: standard normal and Student's t

mod special;
pub mod normal;
pub mod t;

pub use normal::{SnormCdf, SnormInv, normal_cdf, normal_sf, normal_two_tailed, normal_inverse_cdf};
pub use t::{TCdf, TInv, student_t_cdf, student_t_two_tailed, student_t_inverse_cdf};
