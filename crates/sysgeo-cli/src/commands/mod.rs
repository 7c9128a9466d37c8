pub mod convert;
pub mod fetch;
pub mod inspect;
pub mod push;
