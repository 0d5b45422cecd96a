//! End-to-end extraction tests, grouped by concern.

mod adversarial;
mod architectures;
mod buildinfo;
mod sources;
