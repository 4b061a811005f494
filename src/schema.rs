use sea_orm::sea_query::{ColumnDef, ForeignKey, Table, TableCreateStatement};

use crate::entities::{elenco, filme};

pub const FK_ELENCO_FILME: &str = "fk_elenco_filme";

pub fn create_filme() -> TableCreateStatement {
    Table::create()
        .table(filme::Entity)
        .col(
            ColumnDef::new(filme::Column::IdFilme)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(filme::Column::Titulo).string().not_null())
        .col(ColumnDef::new(filme::Column::Genero).string().not_null())
        .col(ColumnDef::new(filme::Column::Origem).string().not_null())
        .col(ColumnDef::new(filme::Column::Duracao).integer().not_null())
        .col(ColumnDef::new(filme::Column::Ano).integer().not_null())
        .col(ColumnDef::new(filme::Column::Capa).string().not_null())
        .col(ColumnDef::new(filme::Column::Trailer).string().not_null())
        .to_owned()
}

/// `elenco` references `filme`, so it must be created after it.
pub fn create_elenco() -> TableCreateStatement {
    Table::create()
        .table(elenco::Entity)
        .col(
            ColumnDef::new(elenco::Column::IdElenco)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(elenco::Column::Ator).string().not_null())
        .col(ColumnDef::new(elenco::Column::Idade).integer().not_null())
        .col(ColumnDef::new(elenco::Column::Nacionalidade).string().not_null())
        .col(ColumnDef::new(elenco::Column::FilmeIdFilme).integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .name(FK_ELENCO_FILME)
                .from(elenco::Entity, elenco::Column::FilmeIdFilme)
                .to(filme::Entity, filme::Column::IdFilme),
        )
        .to_owned()
}

#[cfg(test)]
mod tests {
    use sea_orm::DatabaseBackend;

    use super::*;

    #[test]
    fn filme_ddl_for_mysql() {
        let sql = DatabaseBackend::MySql.build(&create_filme()).sql;

        assert!(sql.starts_with("CREATE TABLE `filme`"), "{sql}");
        assert!(sql.contains("`idFilme` int NOT NULL AUTO_INCREMENT PRIMARY KEY"), "{sql}");
        for column in ["titulo", "genero", "origem", "capa", "trailer"] {
            assert!(sql.contains(&format!("`{column}` varchar(255) NOT NULL")), "{sql}");
        }
        assert!(sql.contains("`ano` int NOT NULL"), "{sql}");
    }

    #[test]
    fn elenco_declares_integer_foreign_key() {
        let sql = DatabaseBackend::MySql.build(&create_elenco()).sql;

        assert!(sql.contains("`filme_idFilme` int NOT NULL"), "{sql}");
        assert!(
            sql.contains(
                "CONSTRAINT `fk_elenco_filme` FOREIGN KEY (`filme_idFilme`) REFERENCES `filme` (`idFilme`)"
            ),
            "{sql}"
        );
    }
}
