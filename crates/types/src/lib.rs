pub mod handle;
pub mod object;
pub mod version;

pub use handle::*;
pub use object::*;
pub use version::*;

#[cfg(test)]
mod tests;
