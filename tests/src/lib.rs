//! Cross-crate conformance tests exercising the client-side pipeline
//! end-to-end, rather than one component in isolation (those live
//! beside their own crate's source as `#[cfg(test)]` modules). Named
//! after the seed scenarios (S1-S6) and properties of the pipeline's
//! acceptance criteria.

mod pipeline_copy_area;
mod pipeline_log_writer;
mod pipeline_savepoint;
mod pipeline_two_phase_commit;
mod pipeline_wire_dbtype;
