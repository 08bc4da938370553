//! Body size limits applied while decoding.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Default ceiling of a multipart body, 32 MiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 32 << 20;

/// Default ceiling of a urlencoded or JSON body, 10 MiB.
pub const DEFAULT_MAX_FORM_SIZE: u64 = 10 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_upload_size: u64,
    pub max_form_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_upload_size: DEFAULT_MAX_UPLOAD_SIZE, max_form_size: DEFAULT_MAX_FORM_SIZE }
    }
}

/// Shared, runtime adjustable body limits.
///
/// Reads never block: every decode loads a consistent snapshot of [`Limits`], setters replace it.
#[derive(Debug)]
pub struct UploadPolicy {
    limits: ArcSwap<Limits>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl UploadPolicy {
    pub fn new(limits: Limits) -> Self {
        Self { limits: ArcSwap::from_pointee(limits) }
    }

    pub fn limits(&self) -> Limits {
        **self.limits.load()
    }

    pub fn max_upload_size(&self) -> u64 {
        self.limits.load().max_upload_size
    }

    pub fn set_max_upload_size(&self, size: u64) {
        self.update(|limits| limits.max_upload_size = size);
    }

    pub fn max_form_size(&self) -> u64 {
        self.limits.load().max_form_size
    }

    pub fn set_max_form_size(&self, size: u64) {
        self.update(|limits| limits.max_form_size = size);
    }

    /// The multipart ceiling for one decode, a type's own limit wins over the shared one
    pub fn upload_limit_for(&self, type_limit: Option<u64>) -> u64 {
        type_limit.unwrap_or_else(|| self.max_upload_size())
    }

    fn update<F>(&self, f: F)
    where
        F: Fn(&mut Limits),
    {
        self.limits.rcu(|current| {
            let mut next = **current;
            f(&mut next);
            Arc::new(next)
        });
    }
}
