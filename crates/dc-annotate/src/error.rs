use dc_render::ExportError;

/// Failures surfaced by the annotation engine. None of them leave the
/// canvas partially modified.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("drawing surface failed to initialize: {0}")]
    Init(String),
    #[error("drawing surface is not ready")]
    NotReady,
    #[error("failed to serialize canvas: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to restore canvas: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("history import rejected: {0}")]
    History(String),
    #[error("failed to encode history: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode history: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}
