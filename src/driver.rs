use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    RelationTrait, Set,
    sea_query::{DeleteStatement, Expr, InsertStatement, SelectStatement, UpdateStatement},
};
use tracing::{info, warn};

use crate::{
    entities::{elenco, filme},
    error::DbError,
    models::{Row, display_value},
    schema,
    session::Session,
};

pub const PAD_WIDTH: usize = 20;

/// Pads `value` with trailing spaces up to `width` characters.
pub fn fill(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    format!("{value}{}", " ".repeat(width - len))
}

pub fn format_row(row: &Row) -> String {
    row.values().map(|v| fill(&display_value(v), PAD_WIDTH)).collect::<Vec<_>>().join(" ")
}

fn movie(id: i32, titulo: &str) -> filme::ActiveModel {
    filme::ActiveModel {
        id_filme: Set(id),
        titulo: Set(titulo.to_string()),
        genero: Set("Herois".to_string()),
        origem: Set("EUA".to_string()),
        duracao: Set(2),
        ano: Set(2023),
        capa: Set("image.jpg".to_string()),
        trailer: Set("video.mp4".to_string()),
    }
}

fn cast_member(id: i32, ator: &str, filme_id: i32) -> elenco::ActiveModel {
    elenco::ActiveModel {
        id_elenco: Set(id),
        ator: Set(ator.to_string()),
        idade: Set(25),
        nacionalidade: Set("Brasileiro".to_string()),
        filme_id_filme: Set(filme_id),
    }
}

pub fn insert_movies() -> InsertStatement {
    filme::Entity::insert_many([movie(1, "Filme A"), movie(2, "Filme B"), movie(3, "Filme C")])
        .into_query()
}

/// Robert plays in "Filme A" alongside Felipe.
pub fn insert_cast() -> InsertStatement {
    elenco::Entity::insert_many([
        cast_member(1, "Felipe", 1),
        cast_member(2, "Ana", 2),
        cast_member(3, "Maria", 3),
        cast_member(4, "Robert", 1),
    ])
    .into_query()
}

pub fn rename_cast_member(id: i32, ator: &str, idade: i32) -> UpdateStatement {
    elenco::Entity::update_many()
        .col_expr(elenco::Column::Ator, Expr::value(ator))
        .col_expr(elenco::Column::Idade, Expr::value(idade))
        .filter(elenco::Column::IdElenco.eq(id))
        .into_query()
}

pub fn delete_cast_member(id: i32) -> DeleteStatement {
    elenco::Entity::delete_many().filter(elenco::Column::IdElenco.eq(id)).into_query()
}

/// Actor, movie title and year for every cast member.
pub fn cast_with_movies() -> SelectStatement {
    elenco::Entity::find()
        .select_only()
        .column(elenco::Column::Ator)
        .column(filme::Column::Titulo)
        .column(filme::Column::Ano)
        .join(JoinType::InnerJoin, elenco::Relation::Filme.def())
        .order_by_asc(elenco::Column::IdElenco)
        .into_query()
}

fn report(step: &str, err: &DbError) {
    if err.is_no_connection() {
        warn!(step, error = %err, "no connection");
    } else {
        warn!(step, error = %err, "step failed");
    }
}

/// Runs the demo script. Failures are logged and the script moves on;
/// the rows of the final join are printed and returned.
pub fn run(session: &mut Session, reset: bool) -> Vec<Row> {
    if reset {
        for (name, result) in [
            ("elenco", session.drop_table(elenco::Entity)),
            ("filme", session.drop_table(filme::Entity)),
        ] {
            match result {
                Ok(_) => info!(table = name, "table dropped"),
                Err(err) => report("drop table", &err),
            }
        }
    }

    match session.create_table(&schema::create_filme()) {
        Ok(()) => info!(table = "filme", "table created"),
        Err(err) => report("create table filme", &err),
    }

    match session.create_table(&schema::create_elenco()) {
        Ok(()) => info!(table = "elenco", "table created"),
        Err(err) => report("create table elenco", &err),
    }

    match session.execute(&insert_movies()) {
        Ok(rows) => info!(rows, "movies inserted"),
        Err(err) => report("insert movies", &err),
    }

    match session.execute(&insert_cast()) {
        Ok(rows) => info!(rows, "cast inserted"),
        Err(err) => report("insert cast", &err),
    }

    match session.execute(&rename_cast_member(1, "Felipe Santos", 29)) {
        Ok(rows) => info!(rows, "renamed Felipe to Felipe Santos, age 29"),
        Err(err) => report("update cast member", &err),
    }

    match session.execute(&delete_cast_member(4)) {
        Ok(rows) => info!(rows, "removed Robert from the cast"),
        Err(err) => report("delete cast member", &err),
    }

    let printed = session.execute_select(&cast_with_movies(), |rows| {
        if rows.is_empty() {
            info!("no records");
        }
        for row in &rows {
            println!("{}", format_row(row));
        }
        rows
    });

    match printed {
        Ok(rows) => rows,
        Err(err) => {
            report("select cast with movies", &err);
            info!("no records");
            Vec::new()
        },
    }
}
