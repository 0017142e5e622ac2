pub mod scid_converter;
