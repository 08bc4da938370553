//! Recursive validation of decoded forms.
//!
//! A form is validated depth-first: every field declared as embedded, nested or validatable is
//! checked in declaration order before the form's own [`Validate::validate`] runs, and the first
//! error stops the walk. A container can therefore assume that its components are already valid
//! and only check cross-field invariants.
//!
//! The walk itself is [`Fields::validate_fields`], normally generated by `#[derive(Fields)]` or
//! `#[derive(Form)]`:
//!
//! ```
//! use micro_form::{BoxError, Fields, Validate};
//!
//! #[derive(Fields)]
//! struct Signup {
//!     name: String,
//!     #[form(nested)]
//!     address: Option<Box<Address>>,
//! }
//!
//! #[derive(Fields)]
//! struct Address {
//!     zip: String,
//! }
//!
//! impl Validate for Signup {
//!     fn validate(&self) -> Result<(), BoxError> {
//!         if self.name.is_empty() {
//!             return Err("name is empty".into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Validate for Address {
//!     fn validate(&self) -> Result<(), BoxError> {
//!         if self.zip.len() != 5 {
//!             return Err("zip must have 5 digits".into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let signup = Signup { name: "zava".into(), address: None };
//! assert!(micro_form::validate(&signup).is_ok());
//!
//! let signup = Signup { name: "zava".into(), address: Some(Box::new(Address { zip: "123".into() })) };
//! assert!(micro_form::validate(&signup).is_err());
//! ```
//!
//! A field marked `#[form(validate)]` is walked the same way, so its type implements both
//! traits; a leaf value gets an empty `impl Fields`.
//!
//! Cyclic values are not supported: the walk has no cycle detection.

use crate::BoxError;
use std::rc::Rc;
use std::sync::Arc;

/// A value that can check itself.
///
/// The default implementation accepts everything, so a structure without a container-level
/// invariant can opt in with an empty `impl`.
pub trait Validate {
    fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// The validation walk over a structure's components.
pub trait Fields {
    /// Validates the embedded, nested and validatable fields in declaration order,
    /// stopping at the first error.
    fn validate_fields(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Validates `value`: its components first, then the value itself.
///
/// Returns the first error in traversal order. A `None` value is valid.
pub fn validate<T>(value: &T) -> Result<(), BoxError>
where
    T: Validate + Fields + ?Sized,
{
    value.validate_fields()?;
    value.validate()
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), BoxError> {
        match self {
            Some(value) => value.validate(),
            None => Ok(()),
        }
    }
}

impl<T: Fields> Fields for Option<T> {
    fn validate_fields(&self) -> Result<(), BoxError> {
        match self {
            Some(value) => value.validate_fields(),
            None => Ok(()),
        }
    }
}

macro_rules! delegate_pointer {
    ($($ptr:ident),+) => {
        $(
            impl<T: Validate + ?Sized> Validate for $ptr<T> {
                #[inline]
                fn validate(&self) -> Result<(), BoxError> {
                    (**self).validate()
                }
            }

            impl<T: Fields + ?Sized> Fields for $ptr<T> {
                #[inline]
                fn validate_fields(&self) -> Result<(), BoxError> {
                    (**self).validate_fields()
                }
            }
        )+
    };
}

delegate_pointer!(Box, Rc, Arc);
