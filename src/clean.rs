use deunicode::deunicode;
use polars::prelude::*;

use crate::error::Result;

/// Canonical form of a subprefecture name, so spellings from different portals join.
///
/// Accents are transliterated to ASCII and the text upper-cased; apostrophes become
/// spaces, slashes become hyphens, and the " PAULISTA" and "-JARAGUA" qualifiers are
/// removed (in that order).
pub fn clean_subprefeitura(name: &str) -> String {
    deunicode(name)
        .to_uppercase()
        .replace('\'', " ")
        .replace('/', "-")
        .replace(" PAULISTA", "")
        .replace("-JARAGUA", "")
}

/// Apply [`clean_subprefeitura`] to every value of a text column; nulls stay null.
pub fn clean_subprefeitura_column(column: &Column) -> Result<Column> {
    let cleaned = column.str()?.into_iter()
        .map(|value| value.map(clean_subprefeitura))
        .collect::<Vec<_>>();
    Ok(Column::new(column.name().clone(), cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_qualifiers() {
        assert_eq!(clean_subprefeitura("São Miguel Paulista"), "SAO MIGUEL");
        assert_eq!(clean_subprefeitura("Pirituba/Jaraguá"), "PIRITUBA");
        assert_eq!(clean_subprefeitura("M'Boi Mirim"), "M BOI MIRIM");
        assert_eq!(clean_subprefeitura("Freguesia/Brasilândia"), "FREGUESIA-BRASILANDIA");
        assert_eq!(clean_subprefeitura("Vila Maria/Vila Guilherme"), "VILA MARIA-VILA GUILHERME");
    }

    #[test]
    fn already_clean_names_are_stable() {
        let once = clean_subprefeitura("Cidade Tiradentes");
        assert_eq!(clean_subprefeitura(&once), once);
    }

    #[test]
    fn column_keeps_name_and_nulls() {
        let column = Column::new("nm_subpref".into(), &[Some("Sé"), None, Some("Lapa")]);
        let cleaned = clean_subprefeitura_column(&column).unwrap();

        assert_eq!(cleaned.name().as_str(), "nm_subpref");
        let values = cleaned.str().unwrap().into_iter().collect::<Vec<_>>();
        assert_eq!(values, vec![Some("SE"), None, Some("LAPA")]);
    }
}
