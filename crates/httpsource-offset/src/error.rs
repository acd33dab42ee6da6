use httpsource_core::PointerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OffsetError {
    #[error("offset pointer error: {0}")]
    Pointer(#[from] PointerError),

    #[error("chaining offset requires a parent value, none was supplied")]
    MissingParentValue,
}
