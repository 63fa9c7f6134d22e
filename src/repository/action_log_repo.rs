// ==========================================
// Class Generation Engine - Generation audit log repository
// ==========================================
// Table: class_generation_log
// Rule: append-only
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::GenerationLogRepository;
