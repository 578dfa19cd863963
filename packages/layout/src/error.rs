use std::path::PathBuf;

use common::AdType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("newspaper has no publisher mapped")]
    NoPublisherMapped,

    #[error("no print template for publisher '{publisher}' and ad type '{ad_type}'")]
    TemplateNotFound { publisher: String, ad_type: AdType },

    #[error("publisher '{0}' has no layout profile")]
    UnknownPublisher(String),

    #[error("font file not found: {}", .0.display())]
    FontMissing(PathBuf),

    #[error("invalid font: {0}")]
    Font(String),

    #[error("invalid publisher configuration: {0}")]
    Config(String),

    #[error("invalid template: {0}")]
    Template(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render task failed: {0}")]
    Task(String),
}
