//! # formwork-http
//!
//! The request payload consumed by formwork fields. A [`FormRequest`] pairs
//! an ordered body namespace ([`QueryDict`]) with a file namespace
//! ([`FileDict`] of [`TempFile`] handles). Transport concerns (parsing HTTP,
//! multipart bodies) belong to the embedding application.

pub mod querydict;
pub mod request;
pub mod upload;

pub use querydict::QueryDict;
pub use request::FormRequest;
pub use upload::{FileDict, TempFile};
