mod karakeep;

pub use karakeep::{KarakeepClient, ListFilter, Page};
