//! Wide summary report: assembly and export.

pub mod assembler;
pub mod export;

pub use assembler::ReportAssembler;
pub use export::ReportExporter;
