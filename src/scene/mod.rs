pub(crate) mod document;
pub(crate) mod model;
pub(crate) mod validate;
