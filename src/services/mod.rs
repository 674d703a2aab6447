pub mod batch_renamer;
pub mod confirm;
pub mod ocr_service;
pub mod page_orderer;
pub mod pdf_assembler;
pub mod text_writer;
pub mod token_estimator;

pub use batch_renamer::rename_files;
pub use confirm::{confirmer_for, AssumeYes, Confirmer, TerminalConfirmer};
pub use ocr_service::{OcrService, PageImage, TextExtractor};
pub use page_orderer::reorder;
pub use pdf_assembler::{DocumentAssembler, PdfAssembler};
pub use text_writer::TextWriter;
pub use token_estimator::estimate_tokens;
