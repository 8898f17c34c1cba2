//! Image source conversion.

use url::Url;

use crate::errors::CanvasError;

/// Rewrites image sources before they are written to the output.
pub trait SourceConverter {
    fn convert(&self, src: &str) -> String;
}

/// Leaves sources untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl SourceConverter for IdentityConverter {
    fn convert(&self, src: &str) -> String {
        src.to_string()
    }
}

/// Resolves relative sources against the page URL.
///
/// Root-relative sources (`/a.png`) land on the page's origin, other relative
/// sources next to the page, with dot segments removed. Absolute,
/// scheme-relative and `data:` sources are kept as they are.
#[derive(Debug, Clone)]
pub struct UrlConverter {
    pub enabled: bool,
    base: Url,
}

impl UrlConverter {
    /// Build a converter from a page URL such as `https://host/app/index.html`.
    pub fn new(page_url: &str) -> Result<Self, CanvasError> {
        let base = Url::parse(page_url).map_err(|source| CanvasError::InvalidBaseUrl {
            url: page_url.to_string(),
            source,
        })?;
        Ok(Self {
            enabled: true,
            base,
        })
    }

    /// The parsed page URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn is_relative(src: &str) -> bool {
        !src.starts_with("//") && Url::parse(src).is_err()
    }
}

impl SourceConverter for UrlConverter {
    fn convert(&self, src: &str) -> String {
        if !self.enabled || !Self::is_relative(src) {
            return src.to_string();
        }
        match self.base.join(src) {
            Ok(resolved) => resolved.into(),
            Err(_err) => {
                crate::log::warn!(src, error = %_err, "image source left unresolved");
                src.to_string()
            }
        }
    }
}
