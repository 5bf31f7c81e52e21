pub mod etablissement;
pub mod manager;

pub use etablissement::{Etablissement, EtablissementStore, InMemoryEtablissementStore, PgEtablissementStore};
pub use manager::{DatabaseError, DatabaseManager};
