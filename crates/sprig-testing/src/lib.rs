//! Testing utilities and harness for Sprig

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
