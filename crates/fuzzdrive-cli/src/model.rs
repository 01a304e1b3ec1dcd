pub(crate) mod controller_model;
