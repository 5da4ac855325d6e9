//! Runtime module — binary lifecycle: boot, command dispatch.

pub mod boot;
pub mod run;
