use std::path::PathBuf;

use common::AdType;

use crate::error::LayoutError;

/// Source of blank print templates.
pub trait TemplateStore: Send + Sync {
    /// Template bytes, or `None` when the publisher has no template for the type.
    fn load(&self, publisher: &str, ad_type: AdType) -> Result<Option<Vec<u8>>, LayoutError>;
}

/// Templates laid out as `{root}/{publisher}/{ad_type}.pdf`.
pub struct FilesystemTemplateStore {
    root: PathBuf,
}

impl FilesystemTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `None` for publisher names that could escape the root.
    pub fn template_path(&self, publisher: &str, ad_type: AdType) -> Option<PathBuf> {
        let safe = !publisher.is_empty()
            && publisher
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        safe.then(|| {
            self.root
                .join(publisher)
                .join(format!("{}.pdf", ad_type.as_str()))
        })
    }
}

impl TemplateStore for FilesystemTemplateStore {
    fn load(&self, publisher: &str, ad_type: AdType) -> Result<Option<Vec<u8>>, LayoutError> {
        let Some(path) = self.template_path(publisher, ad_type) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
