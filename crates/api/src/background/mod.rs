//! Background tasks spawned by the binary entrypoint.

pub mod job_retention;
