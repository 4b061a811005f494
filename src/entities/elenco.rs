use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "elenco")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "idElenco")]
    pub id_elenco: i32,
    pub ator: String,
    pub idade: i32,
    pub nacionalidade: String,
    #[sea_orm(column_name = "filme_idFilme")]
    pub filme_id_filme: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::filme::Entity",
        from = "Column::FilmeIdFilme",
        to = "super::filme::Column::IdFilme"
    )]
    Filme,
}

impl Related<super::filme::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Filme.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
