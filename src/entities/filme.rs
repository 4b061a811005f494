use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "filme")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "idFilme")]
    pub id_filme: i32,
    pub titulo: String,
    pub genero: String,
    pub origem: String,
    pub duracao: i32,
    pub ano: i32,
    pub capa: String,
    pub trailer: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::elenco::Entity")]
    Elenco,
}

impl Related<super::elenco::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Elenco.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
