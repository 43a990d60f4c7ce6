//! Entity modules: one table definition, record type and typed lookups each

pub mod aditivo_nutritivo;
pub mod aditivo_nutritivo_picole;
pub mod conservante;
pub mod conservante_picole;
pub mod picole;
pub mod revendedor;

use crate::repo::Repository;
use crate::Database;

use aditivo_nutritivo::AditivoNutritivo;
use aditivo_nutritivo_picole::AditivoNutritivoPicole;
use conservante::Conservante;
use conservante_picole::ConservantePicole;
use picole::Picole;
use revendedor::Revendedor;

/// Synthetic key of an associative record: `"{other_fk}-{picole_fk}"`.
pub fn association_key(other_fk: i64, picole_fk: i64) -> String {
    format!("{}-{}", other_fk, picole_fk)
}

impl Database {
    pub fn picoles(&self) -> Repository<'_, Picole> {
        self.repo()
    }

    pub fn conservantes(&self) -> Repository<'_, Conservante> {
        self.repo()
    }

    pub fn aditivos_nutritivos(&self) -> Repository<'_, AditivoNutritivo> {
        self.repo()
    }

    pub fn revendedores(&self) -> Repository<'_, Revendedor> {
        self.repo()
    }

    pub fn conservantes_picoles(&self) -> Repository<'_, ConservantePicole> {
        self.repo()
    }

    pub fn aditivos_nutritivos_picoles(&self) -> Repository<'_, AditivoNutritivoPicole> {
        self.repo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_key_puts_picole_last() {
        assert_eq!(association_key(4, 9), "4-9");
    }
}
