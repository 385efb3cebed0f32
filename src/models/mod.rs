// Re-export all model types
pub use self::cart::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::product::*;
pub use self::validation::*;

mod cart;
mod enums;
mod errors;
mod product;
mod validation;
