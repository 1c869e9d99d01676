pub(crate) mod build;
pub(crate) mod helpers;
pub(crate) mod inspect;
