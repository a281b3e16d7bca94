pub mod corretor;

pub use corretor::{Corretor, SiteModel};
