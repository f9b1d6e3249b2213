use thiserror::Error;

/// Failures surfaced by a [`crate::store::TrackStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {context}")]
    StorageUnavailable {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("write failed: {context}")]
    WriteFailed {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("read failed: {context}")]
    ReadFailed {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    pub fn unavailable(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::StorageUnavailable {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn write(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WriteFailed {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn read(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ReadFailed {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}
