pub mod catalog;
pub mod resolve;
pub mod trace;

pub mod util {
    pub mod env;
}
