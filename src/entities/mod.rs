pub mod elenco;
pub mod filme;
