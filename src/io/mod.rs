pub mod json_writer;
pub mod mri_report;
pub mod nifti;
pub mod summary;
pub mod tpm;
pub mod tsv_writer;
