mod rest;

pub use rest::{parse_indicator, TaapiClient};
