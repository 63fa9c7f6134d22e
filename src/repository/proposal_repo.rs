// ==========================================
// Class Generation Engine - Proposal store
// ==========================================
// Tables: generated_class_proposal (header, report JSON),
//         generated_class, generated_class_student
// Rules:
//   run_number = MAX + 1 per term, allocated inside BEGIN IMMEDIATE
//   drafts are replaced whole, guarded by revision + status='DRAFT'
//   approval is a conditional DRAFT -> APPROVED update plus
//   materialization in one transaction
// ==========================================

mod approval;
mod core;
mod mapping;


pub use core::ProposalRepository;
