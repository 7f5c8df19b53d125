pub mod build;
pub mod index;
pub mod inspect;
pub mod search;
