pub(crate) mod conversions;
