//! Record store services.
//!
//! Each service owns one kind of record: patients, visits or discharge summaries. They
//! share the directory and file helpers in [`shared`].

pub mod discharges;
pub mod patients;
pub mod shared;
pub mod visits;
