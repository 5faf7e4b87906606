pub mod product_postgres;

pub use product_postgres::ProductPostgresRepository;
